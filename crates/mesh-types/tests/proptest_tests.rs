//! Property-based tests for mesh invariants using the `proptest` crate.

use proptest::prelude::*;

use mesh_types::{Bounds, ModelId, TriangleMesh};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Coordinates on a coarse grid so that soups share corners often.
fn arb_corner() -> impl Strategy<Value = [f32; 3]> {
    (-4i32..4, -4i32..4, -4i32..4).prop_map(|(x, y, z)| [x as f32, y as f32, z as f32])
}

fn arb_soup() -> impl Strategy<Value = Vec<[[f32; 3]; 3]>> {
    proptest::collection::vec((arb_corner(), arb_corner(), arb_corner()), 1..40)
        .prop_map(|tris| tris.into_iter().map(|(a, b, c)| [a, b, c]).collect())
}

fn arb_point() -> impl Strategy<Value = [f64; 3]> {
    (-1000.0f64..1000.0, -1000.0f64..1000.0, -1000.0f64..1000.0).prop_map(|(x, y, z)| [x, y, z])
}

fn contains(outer: &Bounds, inner: &Bounds) -> bool {
    (0..3).all(|i| outer.min[i] <= inner.min[i] && outer.max[i] >= inner.max[i])
}

// ---------------------------------------------------------------------------
// 1. Welding keeps every triangle and never invents vertices
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn soup_welding_is_valid(soup in arb_soup()) {
        let mesh = TriangleMesh::from_triangle_soup(soup.clone());
        prop_assert_eq!(mesh.triangle_count(), soup.len());
        prop_assert!(mesh.vertex_count() <= soup.len() * 3);
        prop_assert!(mesh.validate().is_ok());

        // Corner positions survive welding exactly.
        let corners: Vec<_> = mesh.triangle_positions().collect();
        prop_assert_eq!(corners, soup);
    }
}

// ---------------------------------------------------------------------------
// 2. Welding twice changes nothing
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn soup_welding_is_idempotent(soup in arb_soup()) {
        let once = TriangleMesh::from_triangle_soup(soup);
        let twice = TriangleMesh::from_triangle_soup(once.triangle_positions());
        prop_assert_eq!(once, twice);
    }
}

// ---------------------------------------------------------------------------
// 3. Merging is a disjoint append
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn merge_adds_counts(a in arb_soup(), b in arb_soup()) {
        let mut left = TriangleMesh::from_triangle_soup(a);
        let right = TriangleMesh::from_triangle_soup(b);
        let (lv, lt) = (left.vertex_count(), left.triangle_count());

        left.merge(&right);
        prop_assert_eq!(left.vertex_count(), lv + right.vertex_count());
        prop_assert_eq!(left.triangle_count(), lt + right.triangle_count());
        prop_assert!(left.validate().is_ok());
    }
}

// ---------------------------------------------------------------------------
// 4. Vertex normals are unit length
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn vertex_normals_are_unit(soup in arb_soup()) {
        let mut mesh = TriangleMesh::from_triangle_soup(soup);
        mesh.compute_vertex_normals();
        prop_assert!(mesh.has_normals());
        for n in mesh.normals.chunks_exact(3) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            prop_assert!((len - 1.0).abs() < 1e-4, "normal length {}", len);
        }
    }
}

// ---------------------------------------------------------------------------
// 5. Bounds of a point set contain the bounds of each subset
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn bounds_of_joined_points_contain_each_part(
        a in proptest::collection::vec(arb_point(), 1..10),
        b in proptest::collection::vec(arb_point(), 1..10),
    ) {
        let ba = Bounds::from_points(a.iter().copied()).unwrap();
        let bb = Bounds::from_points(b.iter().copied()).unwrap();
        let joined = Bounds::from_points(a.into_iter().chain(b)).unwrap();
        prop_assert!(contains(&joined, &ba));
        prop_assert!(contains(&joined, &bb));
    }
}

// ---------------------------------------------------------------------------
// 6. Model ids accept exactly the file-stem-safe alphabet
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn model_id_accepts_safe_names(id in "[A-Za-z0-9_-]{1,32}") {
        let parsed = ModelId::new(id.clone()).unwrap();
        prop_assert_eq!(parsed.as_str(), id.as_str());
        prop_assert_eq!(parsed.file_name("glb"), format!("{}.glb", id));
    }

    #[test]
    fn model_id_rejects_path_separators(
        prefix in "[a-z]{0,8}",
        sep in prop::sample::select(vec!['/', '\\', '.', ' ']),
        suffix in "[a-z]{0,8}",
    ) {
        let id = format!("{prefix}{sep}{suffix}");
        prop_assert!(ModelId::new(id).is_err());
    }
}
