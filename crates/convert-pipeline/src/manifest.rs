//! `models.json`: the list of converted models the web viewer loads.

use std::path::Path;

use chrono::{DateTime, Utc};
use mesh_types::{Bounds, ModelId};
use serde::{Deserialize, Serialize};

use crate::batch::ModelOutcome;
use crate::errors::ConvertError;

pub const MANIFEST_FILE: &str = "models.json";
pub const MANIFEST_FORMAT: &str = "mesh-convert-manifest";
pub const MANIFEST_VERSION: u32 = 1;

/// Why a manifest could not be read back.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ManifestError {
    #[error("invalid manifest JSON: {0}")]
    Parse(String),

    #[error("unexpected manifest format '{0}'")]
    UnknownFormat(String),

    #[error("manifest version {found} is newer than supported {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub format: String,
    pub version: u32,
    pub generated: DateTime<Utc>,
    pub models: Vec<ManifestEntry>,
}

/// One successfully converted model. File names are relative to the
/// manifest's directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub id: ModelId,
    pub name: String,
    pub stl_file: String,
    pub glb_file: String,
    pub triangle_count: usize,
    pub vertex_count: usize,
    pub bounds: Bounds,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Manifest {
    pub fn new(outcomes: &[ModelOutcome], generated: DateTime<Utc>) -> Self {
        let models = outcomes
            .iter()
            .map(|o| ManifestEntry {
                id: o.model_id.clone(),
                name: o.display_name.clone(),
                stl_file: file_name(&o.stl_path),
                glb_file: file_name(&o.glb_path),
                triangle_count: o.mesh.triangle_count,
                vertex_count: o.mesh.vertex_count,
                bounds: o.mesh.bounds,
            })
            .collect();
        Self {
            format: MANIFEST_FORMAT.to_string(),
            version: MANIFEST_VERSION,
            generated,
            models,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a manifest, rejecting foreign formats and newer versions.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let manifest: Self =
            serde_json::from_str(json).map_err(|e| ManifestError::Parse(e.to_string()))?;
        if manifest.format != MANIFEST_FORMAT {
            return Err(ManifestError::UnknownFormat(manifest.format));
        }
        if manifest.version > MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                found: manifest.version,
                supported: MANIFEST_VERSION,
            });
        }
        Ok(manifest)
    }

    pub fn write(&self, path: &Path) -> Result<(), ConvertError> {
        let export_err = |reason: String| ConvertError::Export {
            path: path.to_path_buf(),
            reason,
        };
        let json = self.to_json().map_err(|e| export_err(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| export_err(e.to_string()))
    }
}
