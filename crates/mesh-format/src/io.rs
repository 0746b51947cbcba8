//! Path-based loading and saving; the format follows the file extension.

use std::path::Path;

use mesh_types::TriangleMesh;
use tracing::debug;

use crate::errors::{ExportError, LoadError};
use crate::format::MeshFormat;
use crate::stl::StlEncoding;
use crate::{glb, stl};

/// Options for [`save_mesh`].
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Name stored in the STL header / glTF node. Defaults to the file stem.
    pub name: Option<String>,
    /// STL flavour; ignored for other formats.
    pub stl_encoding: StlEncoding,
}

fn describe(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e} ({})", path.display()))
        .unwrap_or_else(|| format!("no extension ({})", path.display()))
}

/// Read a mesh file, inferring the format from its extension.
pub fn load_mesh(path: &Path) -> Result<TriangleMesh, LoadError> {
    let format =
        MeshFormat::from_path(path).ok_or_else(|| LoadError::UnknownFormat(describe(path)))?;

    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path.to_path_buf())
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    })?;

    let mesh = match format {
        MeshFormat::Stl => stl::decode(&bytes)?,
        MeshFormat::Glb => glb::decode(&bytes)?,
    };
    debug!(
        path = %path.display(),
        triangles = mesh.triangle_count(),
        vertices = mesh.vertex_count(),
        "mesh loaded"
    );
    Ok(mesh)
}

/// Encode `mesh` for `format` without touching the filesystem.
pub fn encode_mesh(
    mesh: &TriangleMesh,
    format: MeshFormat,
    name: &str,
    stl_encoding: StlEncoding,
) -> Result<Vec<u8>, ExportError> {
    match (format, stl_encoding) {
        (MeshFormat::Stl, StlEncoding::Binary) => stl::encode_binary(mesh, name),
        (MeshFormat::Stl, StlEncoding::Ascii) => stl::encode_ascii(mesh, name).map(String::into_bytes),
        (MeshFormat::Glb, _) => glb::encode(mesh, name),
    }
}

/// Write `mesh` to `path`, inferring the format from its extension.
///
/// The mesh is fully encoded before the file is opened, so an encoding
/// error never leaves a partial or truncated file behind.
pub fn save_mesh(mesh: &TriangleMesh, path: &Path, options: &SaveOptions) -> Result<(), ExportError> {
    let format =
        MeshFormat::from_path(path).ok_or_else(|| ExportError::UnknownFormat(describe(path)))?;
    let name = options.name.clone().unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mesh")
            .to_string()
    });

    let bytes = encode_mesh(mesh, format, &name, options.stl_encoding)?;
    std::fs::write(path, &bytes).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "mesh written");
    Ok(())
}
