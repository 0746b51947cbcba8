use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;

/// Structural problems found by [`TriangleMesh::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("mesh has no triangles")]
    Empty,

    #[error("index count {count} is not a multiple of 3")]
    RaggedIndices { count: usize },

    #[error("index {index} out of range (vertex count = {vertex_count})")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("vertex {vertex} has a non-finite coordinate")]
    NonFinite { vertex: usize },

    #[error("normal count {normals} does not match vertex count {vertices}")]
    NormalMismatch { normals: usize, vertices: usize },
}

/// An indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Vertex positions [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Vertex normals [nx, ny, nz, ...]. Empty when not computed.
    pub normals: Vec<f32>,
    /// Triangle indices [i0, i1, i2, ...]
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an indexed mesh from a triangle soup, welding bit-identical positions.
    ///
    /// Vertices are numbered in order of first appearance, so the same soup
    /// always produces the same mesh.
    pub fn from_triangle_soup<I>(triangles: I) -> Self
    where
        I: IntoIterator<Item = [[f32; 3]; 3]>,
    {
        let mut mesh = Self::new();
        let mut seen: HashMap<[u32; 3], u32> = HashMap::new();

        for tri in triangles {
            let mut corner = [0u32; 3];
            for (slot, p) in corner.iter_mut().zip(tri.iter()) {
                let key = [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()];
                *slot = match seen.get(&key) {
                    Some(&idx) => idx,
                    None => {
                        let idx = mesh.add_vertex(*p);
                        seen.insert(key, idx);
                        idx
                    }
                };
            }
            mesh.add_triangle(corner[0], corner[1], corner[2]);
        }

        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    pub fn add_vertex(&mut self, pos: [f32; 3]) -> u32 {
        let idx = self.vertex_count() as u32;
        self.positions.extend_from_slice(&pos);
        idx
    }

    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    pub fn position(&self, vertex: usize) -> [f32; 3] {
        let base = vertex * 3;
        [
            self.positions[base],
            self.positions[base + 1],
            self.positions[base + 2],
        ]
    }

    /// Iterate triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Iterate triangles as corner positions.
    pub fn triangle_positions(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.triangles().map(|[a, b, c]| {
            [
                self.position(a as usize),
                self.position(b as usize),
                self.position(c as usize),
            ]
        })
    }

    /// Append `other` as a disjoint set of vertices and triangles.
    pub fn merge(&mut self, other: &TriangleMesh) {
        if other.positions.is_empty() {
            return;
        }
        let offset = self.vertex_count() as u32;
        // Normals survive only when both sides carry them.
        let keep_normals = (self.positions.is_empty() || self.has_normals()) && other.has_normals();
        if keep_normals {
            self.normals.extend_from_slice(&other.normals);
        } else {
            self.normals.clear();
        }
        self.positions.extend_from_slice(&other.positions);
        for &idx in &other.indices {
            self.indices.push(idx + offset);
        }
    }

    /// Axis-aligned bounds of all vertex positions.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(
            self.positions
                .chunks_exact(3)
                .map(|p| [p[0] as f64, p[1] as f64, p[2] as f64]),
        )
    }

    /// Unit normal of one triangle, or +Z when the triangle is degenerate.
    pub fn face_normal(&self, triangle: usize) -> [f32; 3] {
        let base = triangle * 3;
        let v0 = self.position(self.indices[base] as usize);
        let v1 = self.position(self.indices[base + 1] as usize);
        let v2 = self.position(self.indices[base + 2] as usize);
        triangle_normal(v0, v1, v2)
    }

    /// Replace `normals` with area-weighted vertex normals.
    pub fn compute_vertex_normals(&mut self) {
        let mut acc = vec![0.0f32; self.positions.len()];
        for [a, b, c] in self.triangles() {
            let v0 = self.position(a as usize);
            let v1 = self.position(b as usize);
            let v2 = self.position(c as usize);
            // Unnormalized cross product weights by area.
            let n = cross(sub(v1, v0), sub(v2, v0));
            for idx in [a, b, c] {
                let base = idx as usize * 3;
                acc[base] += n[0];
                acc[base + 1] += n[1];
                acc[base + 2] += n[2];
            }
        }
        for n in acc.chunks_exact_mut(3) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            if len > 1e-12 {
                n[0] /= len;
                n[1] /= len;
                n[2] /= len;
            } else {
                n.copy_from_slice(&[0.0, 0.0, 1.0]);
            }
        }
        self.normals = acc;
    }

    /// Check index ranges, finiteness and normal layout. An empty mesh is an error.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::RaggedIndices {
                count: self.indices.len(),
            });
        }
        if self.indices.is_empty() {
            return Err(MeshError::Empty);
        }

        let vertex_count = self.vertex_count();
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&idx| idx as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        if let Some(vertex) = self
            .positions
            .chunks_exact(3)
            .position(|p| p.iter().any(|c| !c.is_finite()))
        {
            return Err(MeshError::NonFinite { vertex });
        }

        if !self.normals.is_empty() && self.normals.len() != self.positions.len() {
            return Err(MeshError::NormalMismatch {
                normals: self.normals.len() / 3,
                vertices: vertex_count,
            });
        }

        Ok(())
    }
}

pub(crate) fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Unit normal of a triangle given by its corners; +Z when degenerate.
pub fn triangle_normal(v0: [f32; 3], v1: [f32; 3], v2: [f32; 3]) -> [f32; 3] {
    let n = cross(sub(v1, v0), sub(v2, v0));
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-12 {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_quad() -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        mesh.add_vertex([0.0, 0.0, 0.0]);
        mesh.add_vertex([1.0, 0.0, 0.0]);
        mesh.add_vertex([1.0, 1.0, 0.0]);
        mesh.add_vertex([0.0, 1.0, 0.0]);
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        mesh
    }

    #[test]
    fn counts() {
        let mesh = unit_quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn merge_is_disjoint() {
        let mut a = unit_quad();
        let b = unit_quad();
        a.merge(&b);
        assert_eq!(a.vertex_count(), 8);
        assert_eq!(a.triangle_count(), 4);
        assert_eq!(&a.indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn merge_drops_normals_when_one_side_lacks_them() {
        let mut a = unit_quad();
        a.compute_vertex_normals();
        a.merge(&unit_quad());
        assert!(a.normals.is_empty());
        assert!(a.validate().is_ok());
    }

    #[test]
    fn merge_into_empty_keeps_normals() {
        let mut b = unit_quad();
        b.compute_vertex_normals();
        let mut a = TriangleMesh::new();
        a.merge(&b);
        assert!(a.has_normals());
    }

    #[test]
    fn soup_welds_shared_corners() {
        let soup = vec![
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        ];
        let mesh = TriangleMesh::from_triangle_soup(soup);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn face_normal_of_ccw_triangle_points_up() {
        let mesh = unit_quad();
        assert_eq!(mesh.face_normal(0), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn vertex_normals_are_unit() {
        let mut mesh = unit_quad();
        mesh.compute_vertex_normals();
        assert!(mesh.has_normals());
        for n in mesh.normals.chunks_exact(3) {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn validate_reports_problems() {
        assert_eq!(TriangleMesh::new().validate(), Err(MeshError::Empty));

        let mut bad = unit_quad();
        bad.indices.push(7);
        assert!(matches!(
            bad.validate(),
            Err(MeshError::RaggedIndices { count: 7 })
        ));

        let mut bad = unit_quad();
        bad.indices[5] = 9;
        assert!(matches!(
            bad.validate(),
            Err(MeshError::IndexOutOfRange { index: 9, .. })
        ));

        let mut bad = unit_quad();
        bad.positions[4] = f32::NAN;
        assert_eq!(bad.validate(), Err(MeshError::NonFinite { vertex: 1 }));
    }

    proptest! {
        #[test]
        fn soup_preserves_triangle_count_and_bounds(
            coords in proptest::collection::vec(-100i32..100, 9..90)
        ) {
            let tris: Vec<[[f32; 3]; 3]> = coords
                .chunks_exact(9)
                .map(|c| {
                    let f = |i: usize| c[i] as f32 * 0.5;
                    [[f(0), f(1), f(2)], [f(3), f(4), f(5)], [f(6), f(7), f(8)]]
                })
                .collect();
            let mesh = TriangleMesh::from_triangle_soup(tris.clone());
            prop_assert_eq!(mesh.triangle_count(), tris.len());
            prop_assert!(mesh.vertex_count() <= tris.len() * 3);
            prop_assert!(mesh.validate().is_ok());

            let soup_bounds = Bounds::from_points(
                tris.iter().flatten().map(|p| [p[0] as f64, p[1] as f64, p[2] as f64]),
            );
            prop_assert_eq!(mesh.bounds(), soup_bounds);

            let again: Vec<_> = mesh.triangle_positions().collect();
            prop_assert_eq!(again, tris);
        }
    }
}
