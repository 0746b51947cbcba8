//! Conversion from truck polygon meshes into pipeline triangle meshes.
//!
//! truck-meshalgo produces a `PolygonMesh` per shell; those are flattened
//! into one `TriangleMesh`, keeping each shell's vertices disjoint.

use mesh_types::TriangleMesh;
use truck_meshalgo::prelude::*;

use crate::types::EngineError;

/// Reject deflections the mesher cannot honour.
pub fn check_deflection(deflection: f64) -> Result<(), EngineError> {
    if deflection.is_finite() && deflection > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidDeflection { value: deflection })
    }
}

/// Append a truck `PolygonMesh` to `mesh`. Quads and larger faces are split
/// into a fan of triangles around their first corner.
pub fn append_polygon_mesh(poly: &PolygonMesh, mesh: &mut TriangleMesh) {
    let offset = mesh.vertex_count() as u32;
    mesh.normals.clear();

    for pos in poly.positions() {
        mesh.add_vertex([pos.x as f32, pos.y as f32, pos.z as f32]);
    }

    for tri in poly.tri_faces() {
        mesh.add_triangle(
            tri[0].pos as u32 + offset,
            tri[1].pos as u32 + offset,
            tri[2].pos as u32 + offset,
        );
    }

    for quad in poly.quad_faces() {
        mesh.add_triangle(
            quad[0].pos as u32 + offset,
            quad[1].pos as u32 + offset,
            quad[2].pos as u32 + offset,
        );
        mesh.add_triangle(
            quad[0].pos as u32 + offset,
            quad[2].pos as u32 + offset,
            quad[3].pos as u32 + offset,
        );
    }

    for face in poly.other_faces() {
        let Some(first) = face.first() else {
            continue;
        };
        for pair in face[1..].windows(2) {
            mesh.add_triangle(
                first.pos as u32 + offset,
                pair[0].pos as u32 + offset,
                pair[1].pos as u32 + offset,
            );
        }
    }
}

/// Final check on a freshly tessellated mesh: non-empty, in range, finite.
pub fn finish_mesh(mut mesh: TriangleMesh) -> Result<TriangleMesh, EngineError> {
    mesh.validate()
        .map_err(|e| EngineError::TessellationFailed {
            reason: e.to_string(),
        })?;
    mesh.compute_vertex_normals();
    Ok(mesh)
}
