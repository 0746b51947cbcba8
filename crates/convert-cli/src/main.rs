//! `mesh-convert`: turn the configured STEP models into STL and GLB files.
//!
//! Exit codes: 0 when every model converted, 1 when any model failed,
//! 2 on configuration or usage errors.

use std::path::PathBuf;
use std::process::ExitCode;

use cad_engine::TruckEngine;
use clap::Parser;
use convert_pipeline::config::DEFAULT_CONFIG_FILE;
use convert_pipeline::{run_batch, ConfigError, ConvertConfig};
use mesh_format::StlEncoding;
use tracing::{error, info};

const EXIT_FAILED_MODELS: u8 = 1;
const EXIT_USAGE: u8 = 2;

/// Convert CAD models (STEP) into web-ready meshes (STL + GLB).
#[derive(Debug, Parser)]
#[command(name = "mesh-convert", version)]
struct Cli {
    /// JSON job list
    #[arg(value_name = "CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory receiving the STL, GLB and manifest files
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Linear deflection used for tessellation (model units)
    #[arg(long, value_name = "D")]
    deflection: Option<f64>,

    /// Write ASCII STL instead of binary
    #[arg(long)]
    ascii_stl: bool,

    /// Skip writing models.json
    #[arg(long)]
    no_manifest: bool,
}

impl Cli {
    /// Config file, then environment, then command line.
    fn resolve_config(&self) -> Result<ConvertConfig, ConfigError> {
        let mut config = ConvertConfig::load(&self.config)?;
        config.apply_env()?;
        self.apply(&mut config)?;
        Ok(config)
    }

    fn apply(&self, config: &mut ConvertConfig) -> Result<(), ConfigError> {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(deflection) = self.deflection {
            config.linear_deflection = deflection;
        }
        if self.ascii_stl {
            config.stl_encoding = StlEncoding::Ascii;
        }
        if self.no_manifest {
            config.write_manifest = false;
        }
        config.validate()
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    info!(
        models = config.models.len(),
        output_dir = %config.output_dir.display(),
        deflection = config.linear_deflection,
        "starting conversion"
    );

    let mut engine = TruckEngine::new();
    let report = run_batch(&mut engine, &config);

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        let failed: Vec<&str> = report.failed.iter().map(|f| f.model_id.as_str()).collect();
        error!(failed = ?failed, "conversion incomplete: {}", report.summary_line());
        ExitCode::from(EXIT_FAILED_MODELS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convert_pipeline::ModelJob;
    use mesh_types::ModelId;

    fn job() -> ModelJob {
        ModelJob::new(ModelId::new("a").unwrap(), "a.step")
    }

    #[test]
    fn defaults_to_convert_json() {
        let cli = Cli::try_parse_from(["mesh-convert"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("convert.json"));
        assert!(cli.output_dir.is_none());
        assert!(!cli.ascii_stl);
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "mesh-convert",
            "jobs.json",
            "--output-dir",
            "dist",
            "--deflection",
            "0.02",
            "--ascii-stl",
            "--no-manifest",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("jobs.json"));

        let mut config = ConvertConfig::new(vec![job()]);
        cli.apply(&mut config).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert_eq!(config.linear_deflection, 0.02);
        assert_eq!(config.stl_encoding, StlEncoding::Ascii);
        assert!(!config.write_manifest);
    }

    #[test]
    fn invalid_deflection_flag_is_config_error() {
        let cli = Cli::try_parse_from(["mesh-convert", "--deflection", "0"]).unwrap();
        let mut config = ConvertConfig::new(vec![job()]);
        assert_eq!(
            cli.apply(&mut config),
            Err(ConfigError::InvalidDeflection(0.0))
        );
    }

    #[test]
    fn flag_repairs_invalid_file_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("convert.json");
        std::fs::write(
            &path,
            r#"{ "linear_deflection": 0, "models": [ { "model_id": "a", "source_path": "a.step" } ] }"#,
        )
        .unwrap();
        let path_arg = path.to_str().unwrap();

        let plain = Cli::try_parse_from(["mesh-convert", path_arg]).unwrap();
        assert_eq!(
            plain.resolve_config(),
            Err(ConfigError::InvalidDeflection(0.0))
        );

        let fixed =
            Cli::try_parse_from(["mesh-convert", path_arg, "--deflection", "0.1"]).unwrap();
        let config = fixed.resolve_config().unwrap();
        assert_eq!(config.linear_deflection, 0.1);
        assert_eq!(config.models[0].source_path, dir.path().join("a.step"));
    }

    #[test]
    fn non_numeric_deflection_is_usage_error() {
        assert!(Cli::try_parse_from(["mesh-convert", "--deflection", "fine"]).is_err());
    }
}
