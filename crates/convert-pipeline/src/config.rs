//! Conversion job list and settings.
//!
//! Loaded from a JSON file, then overridden by environment variables, then by
//! the command line. Everything except `models` has a default.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use mesh_format::StlEncoding;
use mesh_types::ModelId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "convert.json";
pub const DEFAULT_OUTPUT_DIR: &str = "public/models";
pub const DEFAULT_LINEAR_DEFLECTION: f64 = 0.1;

pub const ENV_OUTPUT_DIR: &str = "MESH_CONVERT_OUTPUT_DIR";
pub const ENV_DEFLECTION: &str = "MESH_CONVERT_DEFLECTION";

/// Errors raised while loading or validating a [`ConvertConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {reason}", .path.display())]
    Read { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("config lists no models")]
    NoModels,

    #[error("model id '{0}' is listed more than once")]
    DuplicateModelId(String),

    #[error("linear deflection must be finite and positive, got {0}")]
    InvalidDeflection(f64),

    #[error("model '{0}' has an empty source path")]
    EmptySourcePath(String),

    #[error("{var}={value:?} is not a valid value")]
    InvalidEnv { var: String, value: String },
}

/// One model to convert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelJob {
    pub model_id: ModelId,
    pub source_path: PathBuf,
    /// Name shown in progress output and the manifest. Defaults to the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ModelJob {
    pub fn new(model_id: ModelId, source_path: impl Into<PathBuf>) -> Self {
        Self {
            model_id,
            source_path: source_path.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.model_id.as_str())
    }

    /// `<output_dir>/<model_id>.stl`
    pub fn stl_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.model_id.file_name("stl"))
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_deflection() -> f64 {
    DEFAULT_LINEAR_DEFLECTION
}

fn default_true() -> bool {
    true
}

/// Settings for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_deflection")]
    pub linear_deflection: f64,
    #[serde(default)]
    pub stl_encoding: StlEncoding,
    #[serde(default = "default_true")]
    pub write_manifest: bool,
    pub models: Vec<ModelJob>,
}

impl ConvertConfig {
    /// Default settings around `models`.
    pub fn new(models: Vec<ModelJob>) -> Self {
        Self {
            output_dir: default_output_dir(),
            linear_deflection: DEFAULT_LINEAR_DEFLECTION,
            stl_encoding: StlEncoding::default(),
            write_manifest: true,
            models,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Parse a JSON document. Source paths are kept as written.
    ///
    /// Values are not range-checked; call [`ConvertConfig::validate`] once
    /// every override is applied.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read a JSON config file. Like [`ConvertConfig::from_json`], this
    /// does not validate.
    ///
    /// Relative source paths are resolved against the directory holding the
    /// file; the output directory stays relative to the working directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut config = Self::from_json(&json)?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            for job in &mut config.models {
                if job.source_path.is_relative() {
                    job.source_path = base.join(&job.source_path);
                }
            }
        }
        Ok(config)
    }

    /// Apply `MESH_CONVERT_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply `MESH_CONVERT_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_DEFLECTION) {
            self.linear_deflection = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_DEFLECTION.to_string(),
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        if !self.linear_deflection.is_finite() || self.linear_deflection <= 0.0 {
            return Err(ConfigError::InvalidDeflection(self.linear_deflection));
        }

        let mut seen = HashSet::new();
        for job in &self.models {
            if !seen.insert(job.model_id.as_str()) {
                return Err(ConfigError::DuplicateModelId(job.model_id.to_string()));
            }
            if job.source_path.as_os_str().is_empty() {
                return Err(ConfigError::EmptySourcePath(job.model_id.to_string()));
            }
        }
        Ok(())
    }
}
