//! Configuration for bundle assembly.
//!
//! [`ImportConfig`] holds the constants the importer stamps onto every bundle
//! (charset, MIME types) and the conventions it relies on when talking to the
//! repository (the logical schema file name, the metadata domain suffix).
//! It is serde-friendly so services can load it from YAML or JSON.
//!
//! ```rust
//! use import::ImportConfig;
//!
//! let config = ImportConfig::default();
//! config.validate().expect("defaults are valid");
//! assert_eq!(config.schema_file_name, "schema.xml");
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SUPPORTED_VERSION: u32 = 1;

/// Runtime configuration for schema and metadata imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Version of this configuration layout. Only `1` is understood.
    ///
    /// Default: `1`
    pub version: u32,

    /// Character encoding declared on every bundle.
    ///
    /// Default: `"UTF-8"`
    pub charset: String,

    /// MIME type declared on analysis (OLAP schema) bundles.
    ///
    /// Default: `"application/vnd.pentaho.mondrian+xml"`
    pub analysis_mime_type: String,

    /// MIME type declared on metadata domain bundles.
    ///
    /// Default: `"text/xmi+xml"`
    pub metadata_mime_type: String,

    /// Logical file name of a stored schema. A metadata-only edit re-reads this
    /// file from the repository.
    ///
    /// Default: `"schema.xml"`
    pub schema_file_name: String,

    /// Suffix that turns a catalog name into its metadata domain id. Catalogs
    /// with such a counterpart are hidden from analysis listings.
    ///
    /// Default: `".xmi"`
    pub metadata_extension: String,

    /// Upper bound on a materialized payload, in bytes.
    ///
    /// Payloads are read fully into memory before any processing, so this is
    /// the only thing bounding memory per request.
    ///
    /// Default: `None` (unlimited)
    pub max_payload_bytes: Option<usize>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            charset: "UTF-8".into(),
            analysis_mime_type: "application/vnd.pentaho.mondrian+xml".into(),
            metadata_mime_type: "text/xmi+xml".into(),
            schema_file_name: "schema.xml".into(),
            metadata_extension: ".xmi".into(),
            max_payload_bytes: None,
        }
    }
}

/// Misconfigurations caught by [`ImportConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("unsupported import config version {0}")]
    UnsupportedVersion(u32),

    #[error("`{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("metadata extension `{0}` must start with '.'")]
    InvalidExtension(String),

    #[error("max_payload_bytes must be greater than zero")]
    ZeroPayloadLimit,
}

impl ImportConfig {
    /// Checks the configuration for values that would produce unusable bundles.
    ///
    /// ```rust
    /// use import::{ConfigError, ImportConfig};
    ///
    /// let config = ImportConfig {
    ///     metadata_extension: "xmi".into(),
    ///     ..Default::default()
    /// };
    /// assert_eq!(
    ///     config.validate(),
    ///     Err(ConfigError::InvalidExtension("xmi".into()))
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }

        let required = [
            ("charset", &self.charset),
            ("analysis_mime_type", &self.analysis_mime_type),
            ("metadata_mime_type", &self.metadata_mime_type),
            ("schema_file_name", &self.schema_file_name),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::EmptyField(*field));
        }

        if !self.metadata_extension.starts_with('.') || self.metadata_extension.len() < 2 {
            return Err(ConfigError::InvalidExtension(
                self.metadata_extension.clone(),
            ));
        }

        if self.max_payload_bytes == Some(0) {
            return Err(ConfigError::ZeroPayloadLimit);
        }

        Ok(())
    }

    /// Metadata domain id that shadows `catalog_name`.
    pub fn metadata_domain_id(&self, catalog_name: &str) -> String {
        format!("{catalog_name}{}", self.metadata_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ImportConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.charset, "UTF-8");
        assert_eq!(cfg.analysis_mime_type, "application/vnd.pentaho.mondrian+xml");
        assert!(cfg.max_payload_bytes.is_none());
    }

    #[test]
    fn empty_fields_rejected() {
        let cfg = ImportConfig {
            analysis_mime_type: " ".into(),
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::EmptyField("analysis_mime_type"))
        );
    }

    #[test]
    fn unknown_version_rejected() {
        let cfg = ImportConfig {
            version: 2,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::UnsupportedVersion(2)));
    }

    #[test]
    fn zero_payload_limit_rejected() {
        let cfg = ImportConfig {
            max_payload_bytes: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroPayloadLimit));
    }

    #[test]
    fn bare_dot_extension_rejected() {
        let cfg = ImportConfig {
            metadata_extension: ".".into(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidExtension(_))
        ));
    }

    #[test]
    fn metadata_domain_id_appends_extension() {
        let cfg = ImportConfig::default();
        assert_eq!(cfg.metadata_domain_id("Sales"), "Sales.xmi");
    }
}
