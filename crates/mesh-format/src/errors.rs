use std::path::PathBuf;

use mesh_types::MeshError;

/// Errors while reading a mesh file.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read '{}': {reason}", .path.display())]
    Io { path: PathBuf, reason: String },

    #[error("unknown mesh format: {0}")]
    UnknownFormat(String),

    #[error("malformed STL: {0}")]
    MalformedStl(String),

    #[error("malformed GLB: {0}")]
    MalformedGlb(String),
}

/// Errors while writing a mesh file.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error("mesh has no triangles")]
    EmptyMesh,

    #[error("invalid mesh: {0}")]
    InvalidMesh(MeshError),

    #[error("unknown mesh format: {0}")]
    UnknownFormat(String),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("failed to write '{}': {reason}", .path.display())]
    Io { path: PathBuf, reason: String },
}

impl From<MeshError> for ExportError {
    fn from(e: MeshError) -> Self {
        match e {
            MeshError::Empty => ExportError::EmptyMesh,
            other => ExportError::InvalidMesh(other),
        }
    }
}
