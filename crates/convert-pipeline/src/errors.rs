//! Error taxonomy for one model's conversion.

use std::fmt;
use std::path::{Path, PathBuf};

use cad_engine::EngineError;
use mesh_format::{ExportError, LoadError};
use mesh_types::ModelId;
use serde::Serialize;

/// Why a stage failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// Source missing, unreadable or not a valid model/mesh file.
    #[error("failed to load '{}': {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    /// The document holds no object with a solid shape.
    #[error("no solid geometry in '{}'", .path.display())]
    EmptyGeometry { path: PathBuf },

    #[error("tessellation failed: {reason}")]
    Tessellation { reason: String },

    #[error("failed to write '{}': {reason}", .path.display())]
    Export { path: PathBuf, reason: String },

    #[error("cannot create directory '{}': {reason}", .path.display())]
    Directory { path: PathBuf, reason: String },
}

impl ConvertError {
    /// Map an engine error raised while working on `source`.
    pub(crate) fn from_engine(source: &Path, err: EngineError) -> Self {
        match err {
            EngineError::LoadFailed { path, reason } => Self::Load { path, reason },
            EngineError::DuplicateDocument { .. } => Self::Load {
                path: source.to_path_buf(),
                reason: err.to_string(),
            },
            other => Self::Tessellation {
                reason: other.to_string(),
            },
        }
    }

    pub(crate) fn from_load(path: &Path, err: LoadError) -> Self {
        Self::Load {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn from_export(path: &Path, err: ExportError) -> Self {
        match err {
            ExportError::Io { path, reason } => Self::Export { path, reason },
            other => Self::Export {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        }
    }

    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::EmptyGeometry { .. } => "empty-geometry",
            Self::Tessellation { .. } => "tessellation",
            Self::Export { .. } => "export",
            Self::Directory { .. } => "directory",
        }
    }
}

/// Create `dir` and its parents if absent.
pub(crate) fn ensure_dir(dir: &Path) -> Result<(), ConvertError> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| ConvertError::Directory {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Create the directory that will hold `file`.
pub(crate) fn ensure_parent_dir(file: &Path) -> Result<(), ConvertError> {
    match file.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

/// Pipeline stage of a model conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// STEP document → STL.
    SolidToMesh,
    /// STL → GLB.
    Transcode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::SolidToMesh => write!(f, "stage A (solid-to-mesh)"),
            Stage::Transcode => write!(f, "stage B (transcode)"),
        }
    }
}

/// A model that did not make it through the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("model '{model_id}' failed during {stage}: {error}")]
pub struct JobFailure {
    pub model_id: ModelId,
    pub stage: Stage,
    pub error: ConvertError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_names_model_stage_and_cause() {
        let failure = JobFailure {
            model_id: ModelId::new("x").unwrap(),
            stage: Stage::SolidToMesh,
            error: ConvertError::Load {
                path: PathBuf::from("a.step"),
                reason: "file not found".to_string(),
            },
        };
        assert_eq!(
            failure.to_string(),
            "model 'x' failed during stage A (solid-to-mesh): failed to load 'a.step': file not found"
        );
    }

    #[test]
    fn engine_errors_map_to_taxonomy() {
        let src = Path::new("m.step");
        let load = ConvertError::from_engine(
            src,
            EngineError::LoadFailed {
                path: src.to_path_buf(),
                reason: "bad header".to_string(),
            },
        );
        assert_eq!(load.kind(), "load");

        let tess = ConvertError::from_engine(src, EngineError::InvalidDeflection { value: 0.0 });
        assert_eq!(tess.kind(), "tessellation");
    }

    #[test]
    fn export_io_keeps_its_path() {
        let err = ConvertError::from_export(
            Path::new("a.glb"),
            ExportError::Io {
                path: PathBuf::from("out/a.glb"),
                reason: "denied".to_string(),
            },
        );
        assert_eq!(
            err,
            ConvertError::Export {
                path: PathBuf::from("out/a.glb"),
                reason: "denied".to_string()
            }
        );
    }

    #[test]
    fn ensure_dir_is_idempotent_and_reports_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("public/models");
        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());

        let file = dir.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();
        let err = ensure_dir(&file.join("sub")).unwrap_err();
        assert_eq!(err.kind(), "directory");
    }
}
