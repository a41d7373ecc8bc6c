//! TOML-backed application settings.
//!
//! Settings live in `<app root>/config.toml`. Every field has a serde default
//! so partial or older files keep loading; a missing file is written out with
//! defaults on first launch.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::app_dirs::{self, AppDirError};

/// Default filename used to store the app configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Default filename of the classifier record inside the models directory.
pub const MODEL_FILE_NAME: &str = "digit_classifier.mpk";
/// Overrides the configured model path.
pub const MODEL_PATH_ENV: &str = "DIGITPAD_MODEL_PATH";
/// Overrides the configured inference backend.
pub const BACKEND_ENV: &str = "DIGITPAD_BACKEND";

/// Errors that may occur while loading or saving app configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The application directory could not be prepared.
    #[error("Unable to resolve config directory: {0}")]
    Dir(#[from] AppDirError),
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write a config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to serialize config to TOML.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    /// A value is outside the range the app can work with.
    #[error("Invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// All persisted settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub canvas: CanvasSettings,
}

/// Where the classifier comes from and what shape it expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Record file; `None` means `<app root>/models/digit_classifier.mpk`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub backend: BackendKind,
    /// Side length of the square classifier input.
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_num_classes")]
    pub num_classes: usize,
    /// Channel width of the first residual stage; must match the record.
    #[serde(default = "default_base_width")]
    pub base_width: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: None,
            backend: BackendKind::default(),
            input_size: default_input_size(),
            num_classes: default_num_classes(),
            base_width: default_base_width(),
        }
    }
}

impl ModelSettings {
    /// Path of the classifier record, falling back to the models directory.
    pub fn resolved_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dirs::models_dir()?.join(MODEL_FILE_NAME)),
        }
    }
}

/// Drawing surface settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasSettings {
    /// Side length of the square canvas in pixels.
    #[serde(default = "default_canvas_size")]
    pub size: u32,
    /// Pen diameter in pixels.
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            size: default_canvas_size(),
            stroke_width: default_stroke_width(),
        }
    }
}

/// Tensor backend used for inference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// CPU execution through ndarray.
    #[default]
    Cpu,
    /// GPU execution through wgpu.
    Wgpu,
}

impl BackendKind {
    /// Short identifier shown in the UI.
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Cpu => "cpu",
            BackendKind::Wgpu => "wgpu",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cpu" | "ndarray" => Ok(BackendKind::Cpu),
            "wgpu" | "gpu" | "vulkan" | "metal" => Ok(BackendKind::Wgpu),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

fn default_input_size() -> u32 {
    28
}

fn default_num_classes() -> usize {
    10
}

fn default_base_width() -> usize {
    64
}

fn default_canvas_size() -> u32 {
    280
}

fn default_stroke_width() -> f32 {
    20.0
}

impl AppConfig {
    /// Reject settings that would produce an unusable canvas or model.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.size == 0 {
            return Err(invalid("canvas.size", "must be positive"));
        }
        if !(self.canvas.stroke_width.is_finite() && self.canvas.stroke_width > 0.0) {
            return Err(invalid("canvas.stroke_width", "must be a positive number"));
        }
        if self.model.input_size == 0 {
            return Err(invalid("model.input_size", "must be positive"));
        }
        if self.model.num_classes == 0 {
            return Err(invalid("model.num_classes", "must be positive"));
        }
        if self.model.base_width == 0 {
            return Err(invalid("model.base_width", "must be positive"));
        }
        Ok(())
    }

    /// Apply `DIGITPAD_MODEL_PATH` and `DIGITPAD_BACKEND` if they are set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(MODEL_PATH_ENV)
            && !path.trim().is_empty()
        {
            self.model.path = Some(PathBuf::from(path));
        }
        if let Ok(value) = std::env::var(BACKEND_ENV) {
            match value.parse::<BackendKind>() {
                Ok(kind) => self.model.backend = kind,
                Err(err) => warn!("Ignoring {BACKEND_ENV}: {err}; keeping {}", self.model.backend),
            }
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from disk, writing defaults if the file is missing.
///
/// Environment overrides are applied after the file is read and are never
/// written back.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    let path = config_path()?;
    let mut config = if path.exists() {
        load_from(&path)?
    } else {
        let defaults = AppConfig::default();
        save_to_path(&defaults, &path)?;
        info!("Wrote default config to {}", path.display());
        defaults
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Parse a config file, treating a missing file as defaults.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize settings to `path`, creating parent directories as needed.
pub fn save_to_path(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let text = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, text).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
