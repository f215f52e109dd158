//! Runner configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via --config or TINYSTATE_CONFIG)
//! 3. Environment variables
//! 4. Command-line flags (applied by the caller)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Runner configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output configuration.
    pub output: OutputConfig,
    /// Event processing configuration.
    pub run: RunConfig,
}

impl Config {
    /// Loads configuration from `path` (or TINYSTATE_CONFIG when `path` is
    /// `None`), then applies environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("TINYSTATE_CONFIG").map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn apply_env_overrides(&mut self) {
        self.output.apply_env_overrides();
        self.run.apply_env_overrides();
    }
}

/// Output format for processed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Colorize text output.
    pub color: bool,
    /// List the actions that fired for each event.
    pub show_actions: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
            show_actions: true,
        }
    }
}

impl OutputConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(format) = std::env::var("TINYSTATE_FORMAT") {
            match format.to_lowercase().as_str() {
                "text" => self.format = OutputFormat::Text,
                "json" => self.format = OutputFormat::Json,
                other => tracing::warn!("ignoring unknown TINYSTATE_FORMAT '{}'", other),
            }
        }

        if let Some(color) = env_flag("TINYSTATE_COLOR") {
            self.color = color;
        }

        if let Some(show) = env_flag("TINYSTATE_SHOW_ACTIONS") {
            self.show_actions = show;
        }
    }
}

/// Event processing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Abort when an event is not accepted by the current state.
    pub fail_on_ignored: bool,
}

impl RunConfig {
    fn apply_env_overrides(&mut self) {
        if let Some(fail) = env_flag("TINYSTATE_FAIL_ON_IGNORED") {
            self.fail_on_ignored = fail;
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|value| value == "1" || value.to_lowercase() == "true")
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
}
