//! Service configuration loaded from TOML.

use crate::policy::{AlertPolicy, PolicyViolation};
use crate::store::{UserProfile, DEFAULT_RETAINED_RECORDS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid alert policy: {}", join_violations(.0))]
    InvalidPolicy(Vec<PolicyViolation>),
}

fn join_violations(violations: &[PolicyViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory holding `posture_model.json` and `fall_detection_model.json`
    pub dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("ml_models"),
        }
    }
}

/// In-memory store limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Newest records kept per table (samples, alerts, sessions)
    pub retained_records: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retained_records: DEFAULT_RETAINED_RECORDS,
        }
    }
}

/// Vibration command sent to the device on a posture alert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibrationSettings {
    pub duration_ms: u32,
    pub pattern: String,
}

impl Default for VibrationSettings {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            pattern: "pulse".to_string(),
        }
    }
}

/// Top-level configuration. Every section is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub server: ServerConfig,
    pub policy: AlertPolicy,
    pub vibration: VibrationSettings,
    pub models: ModelConfig,
    pub store: StoreConfig,
    /// Profiles preloaded into the in-memory store
    pub users: Vec<UserProfile>,
}

impl MonitorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config
            .policy
            .validated()
            .map_err(ConfigError::InvalidPolicy)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
