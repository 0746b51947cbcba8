//! Batch runner: every configured model through Stage A then Stage B.
//!
//! A failing model is recorded and the batch moves on to the next one.

use std::path::PathBuf;

use cad_engine::CadEngine;
use chrono::Utc;
use mesh_format::SaveOptions;
use mesh_types::ModelId;
use tracing::{error, info, warn};

use crate::config::{ConvertConfig, ModelJob};
use crate::errors::{ensure_dir, ConvertError, JobFailure, Stage};
use crate::manifest::{Manifest, MANIFEST_FILE};
use crate::stage_a::{convert_solid_to_mesh, MeshSummary, SolidToMeshOptions};
use crate::stage_b::{glb_path_for, transcode_mesh};

/// A model that went through both stages.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutcome {
    pub model_id: ModelId,
    pub display_name: String,
    pub stl_path: PathBuf,
    pub glb_path: PathBuf,
    /// Counts and bounds of the GLB as written.
    pub mesh: MeshSummary,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub succeeded: Vec<ModelOutcome>,
    pub failed: Vec<JobFailure>,
    /// Where the manifest was written, if it was.
    pub manifest_path: Option<PathBuf>,
    pub manifest_error: Option<ConvertError>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// True when every model converted and the manifest (if any) was written.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.manifest_error.is_none()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} of {} models converted, {} failed",
            self.succeeded.len(),
            self.total(),
            self.failed.len()
        )
    }
}

/// Run one model through both stages.
pub fn convert_model<E: CadEngine + ?Sized>(
    engine: &mut E,
    job: &ModelJob,
    config: &ConvertConfig,
) -> Result<ModelOutcome, JobFailure> {
    let fail = |stage: Stage, error: ConvertError| JobFailure {
        model_id: job.model_id.clone(),
        stage,
        error,
    };

    let stl_path = job.stl_path(&config.output_dir);
    let glb_path = glb_path_for(&stl_path);

    info!("Converting {}...", job.display_name());
    convert_solid_to_mesh(
        engine,
        &job.source_path,
        &stl_path,
        job.model_id.as_str(),
        &SolidToMeshOptions::from(config),
    )
    .map_err(|e| fail(Stage::SolidToMesh, e))?;
    info!("✓ Created {}", stl_path.display());

    let save = SaveOptions {
        name: Some(job.display_name().to_string()),
        stl_encoding: config.stl_encoding,
    };
    let mesh = transcode_mesh(&stl_path, &glb_path, &save)
        .map_err(|e| fail(Stage::Transcode, e))?;
    info!("✓ Created {}", glb_path.display());

    Ok(ModelOutcome {
        model_id: job.model_id.clone(),
        display_name: job.display_name().to_string(),
        stl_path,
        glb_path,
        mesh,
    })
}

/// Convert every model in `config`, isolating failures per model.
pub fn run_batch<E: CadEngine + ?Sized>(engine: &mut E, config: &ConvertConfig) -> BatchReport {
    let mut report = BatchReport::default();

    if let Err(err) = ensure_dir(&config.output_dir) {
        error!("{}", err);
        report.failed = config
            .models
            .iter()
            .map(|job| JobFailure {
                model_id: job.model_id.clone(),
                stage: Stage::SolidToMesh,
                error: err.clone(),
            })
            .collect();
        return report;
    }

    for job in &config.models {
        match convert_model(engine, job, config) {
            Ok(outcome) => report.succeeded.push(outcome),
            Err(failure) => {
                error!("{}", failure);
                report.failed.push(failure);
            }
        }
    }

    if config.write_manifest {
        if report.succeeded.is_empty() {
            warn!("no model converted, manifest left untouched");
        } else {
            let path = config.output_dir.join(MANIFEST_FILE);
            match Manifest::new(&report.succeeded, Utc::now()).write(&path) {
                Ok(()) => {
                    info!("✓ Created {}", path.display());
                    report.manifest_path = Some(path);
                }
                Err(err) => {
                    error!("{}", err);
                    report.manifest_error = Some(err);
                }
            }
        }
    }

    info!("{}", report.summary_line());
    report
}
