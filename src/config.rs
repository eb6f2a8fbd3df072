//! YAML configuration for the datasource services.
//!
//! One file carries the import settings, logging for the demo binary and the
//! settings of the in-memory platform.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//!
//! import:
//!   charset: "UTF-8"
//!   analysis_mime_type: "application/vnd.pentaho.mondrian+xml"
//!   metadata_mime_type: "text/xmi+xml"
//!   schema_file_name: "schema.xml"
//!   metadata_extension: ".xmi"
//!   max_payload_bytes: 10485760
//!
//! logging:
//!   level: "info"
//!   json: false
//!
//! platform:
//!   reserved_chars: "/\\\t\r\n"
//! ```

use std::fs;
use std::path::Path;

use import::{ConfigError, ImportConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("invalid import section: {0}")]
    Import(#[from] ConfigError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServiceConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub platform: PlatformConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            version: "1.0".into(),
            import: ImportConfig::default(),
            logging: LoggingConfig::default(),
            platform: PlatformConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: ServiceConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.import.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Logging settings used by the demo binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(()),
            other => Err(ConfigLoadError::Validation(format!(
                "unknown log level `{other}`"
            ))),
        }
    }
}

/// Settings of [`InMemoryPlatform`](crate::InMemoryPlatform).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Characters that may not appear in a stored name.
    pub reserved_chars: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            reserved_chars: "/\\\t\r\n".into(),
        }
    }
}
