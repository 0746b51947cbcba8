//! STEP → STL → GLB conversion pipeline.
//!
//! # Key Components
//!
//! - [`config`]: the job list and conversion settings
//! - [`stage_a`]: solid-to-mesh: STEP document → tessellated STL
//! - [`stage_b`]: transcode: mesh file → mesh file, format from extension
//! - [`batch`]: runs every job with per-model failure isolation
//! - [`manifest`]: `models.json` describing the converted models

pub mod batch;
pub mod config;
pub mod errors;
pub mod manifest;
pub mod stage_a;
pub mod stage_b;

pub use batch::{convert_model, run_batch, BatchReport, ModelOutcome};
pub use config::{ConfigError, ConvertConfig, ModelJob};
pub use errors::{ConvertError, JobFailure, Stage};
pub use manifest::{Manifest, ManifestEntry, ManifestError};
pub use stage_a::{convert_solid_to_mesh, MeshSummary, SolidToMeshOptions};
pub use stage_b::{glb_path_for, transcode_mesh};
