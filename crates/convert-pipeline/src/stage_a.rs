//! Stage A: STEP document → STL.

use std::path::Path;

use cad_engine::{CadEngine, DocumentSession};
use mesh_format::{save_mesh, SaveOptions, StlEncoding};
use mesh_types::{Bounds, TriangleMesh};
use serde::Serialize;
use tracing::debug;

use crate::config::{ConvertConfig, DEFAULT_LINEAR_DEFLECTION};
use crate::errors::{ensure_parent_dir, ConvertError};

/// Size and extent of a written mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeshSummary {
    pub triangle_count: usize,
    pub vertex_count: usize,
    pub bounds: Bounds,
}

impl MeshSummary {
    /// `None` for a mesh without vertices.
    pub fn of(mesh: &TriangleMesh) -> Option<Self> {
        Some(Self {
            triangle_count: mesh.triangle_count(),
            vertex_count: mesh.vertex_count(),
            bounds: mesh.bounds()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidToMeshOptions {
    /// Maximum distance between the tessellation and the true surface.
    pub linear_deflection: f64,
    pub stl_encoding: StlEncoding,
}

impl Default for SolidToMeshOptions {
    fn default() -> Self {
        Self {
            linear_deflection: DEFAULT_LINEAR_DEFLECTION,
            stl_encoding: StlEncoding::default(),
        }
    }
}

impl From<&ConvertConfig> for SolidToMeshOptions {
    fn from(config: &ConvertConfig) -> Self {
        Self {
            linear_deflection: config.linear_deflection,
            stl_encoding: config.stl_encoding,
        }
    }
}

/// Tessellate every solid in `source` into one STL at `output`.
///
/// The document is opened under a fresh name derived from `label` and is
/// closed before returning, whatever the outcome. `output` is only written
/// once a valid mesh exists.
pub fn convert_solid_to_mesh<E: CadEngine + ?Sized>(
    engine: &mut E,
    source: &Path,
    output: &Path,
    label: &str,
    options: &SolidToMeshOptions,
) -> Result<MeshSummary, ConvertError> {
    debug!(source = %source.display(), "stage A: loading");
    let mut session = DocumentSession::open(engine, source, label)
        .map_err(|e| ConvertError::from_engine(source, e))?;

    debug!(document = %session.name(), "stage A: processing");
    let shape = session
        .merged_shape()
        .map_err(|e| ConvertError::from_engine(source, e))?
        .ok_or_else(|| ConvertError::EmptyGeometry {
            path: source.to_path_buf(),
        })?;
    let mesh = session
        .tessellate(&shape, options.linear_deflection)
        .map_err(|e| ConvertError::from_engine(source, e))?;
    let summary = MeshSummary::of(&mesh).ok_or_else(|| ConvertError::Tessellation {
        reason: "tessellation produced no vertices".to_string(),
    })?;

    debug!(output = %output.display(), triangles = summary.triangle_count, "stage A: writing");
    ensure_parent_dir(output)?;
    let save = SaveOptions {
        name: Some(label.to_string()),
        stl_encoding: options.stl_encoding,
    };
    save_mesh(&mesh, output, &save).map_err(|e| ConvertError::from_export(output, e))?;

    session
        .close()
        .map_err(|e| ConvertError::from_engine(source, e))?;
    debug!(output = %output.display(), "stage A: done");
    Ok(summary)
}
