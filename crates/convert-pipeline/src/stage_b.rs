//! Stage B: mesh file → mesh file, formats inferred from the extensions.

use std::path::{Path, PathBuf};

use mesh_format::{load_mesh, save_mesh, SaveOptions};
use tracing::debug;

use crate::errors::{ensure_parent_dir, ConvertError};
use crate::stage_a::MeshSummary;

/// `part.stl` → `part.glb`
pub fn glb_path_for(mesh_path: &Path) -> PathBuf {
    mesh_path.with_extension("glb")
}

/// Re-encode `input` as `output`, keeping positions and triangle indices.
pub fn transcode_mesh(
    input: &Path,
    output: &Path,
    options: &SaveOptions,
) -> Result<MeshSummary, ConvertError> {
    debug!(input = %input.display(), "stage B: loading");
    let mesh = load_mesh(input).map_err(|e| ConvertError::from_load(input, e))?;

    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "stage B: processing"
    );
    let summary = MeshSummary::of(&mesh).ok_or_else(|| ConvertError::Export {
        path: output.to_path_buf(),
        reason: "mesh has no vertices".to_string(),
    })?;

    debug!(output = %output.display(), "stage B: writing");
    ensure_parent_dir(output)?;
    save_mesh(&mesh, output, options).map_err(|e| ConvertError::from_export(output, e))?;

    debug!(output = %output.display(), "stage B: done");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::TriangleMesh;

    fn write_tetra(path: &Path) {
        let mut mesh = TriangleMesh::new();
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] {
            mesh.add_vertex(p);
        }
        mesh.add_triangle(0, 2, 1);
        mesh.add_triangle(0, 1, 3);
        mesh.add_triangle(0, 3, 2);
        mesh.add_triangle(1, 2, 3);
        save_mesh(&mesh, path, &SaveOptions::default()).unwrap();
    }

    #[test]
    fn glb_path_swaps_extension() {
        assert_eq!(
            glb_path_for(Path::new("public/models/a.stl")),
            PathBuf::from("public/models/a.glb")
        );
    }

    #[test]
    fn stl_to_glb_keeps_counts() {
        let dir = tempfile::tempdir().unwrap();
        let stl = dir.path().join("t.stl");
        let glb = dir.path().join("t.glb");
        write_tetra(&stl);

        let summary = transcode_mesh(&stl, &glb, &SaveOptions::default()).unwrap();
        assert_eq!(summary.vertex_count, 4);
        assert_eq!(summary.triangle_count, 4);

        let back = load_mesh(&glb).unwrap();
        assert_eq!(back.vertex_count(), 4);
        assert_eq!(back.indices, load_mesh(&stl).unwrap().indices);
    }

    #[test]
    fn missing_input_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let glb = dir.path().join("t.glb");
        let err =
            transcode_mesh(&dir.path().join("t.stl"), &glb, &SaveOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Load { .. }));
        assert!(!glb.exists());
    }

    #[test]
    fn unknown_target_is_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let stl = dir.path().join("t.stl");
        write_tetra(&stl);
        let err = transcode_mesh(&stl, &dir.path().join("t.usdz"), &SaveOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Export { .. }));
    }
}
