//! Error surface of the datasource services.
//!
//! Failures from collaborators are wrapped, never re-labelled: a pipeline
//! rejection keeps its [`ImportStatus`], a registry failure keeps its kind.
//! Callers map these onto user-visible outcomes themselves.
//!
//! | Error | When |
//! |-------|------|
//! | [`ServiceError::Unauthorized`] | caller cannot administer; nothing was touched |
//! | [`ServiceError::NotFound`] | a download found no stored files |
//! | [`ServiceError::Registry`] | catalog removal or listing failed |
//! | [`ServiceError::Import`] | the import pipeline rejected the bundle |
//! | [`ServiceError::Repository`] | repository read or removal failed |
//! | [`ServiceError::Bundle`] | the upload could not become a bundle |
use std::fmt;

use import::{BundleError, RepositoryError};
use thiserror::Error;

/// Outcome codes reported by the import pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ImportStatus {
    PublishFailed,
    GeneralError,
    Success,
    DatasourceError,
    XmlaCatalogExists,
    SchemaExists,
    /// Content already exists and overwrite was not allowed.
    ContentExists,
    /// The name contains reserved symbols.
    ProhibitedSymbols,
    Other(i32),
}

impl ImportStatus {
    pub fn code(self) -> i32 {
        match self {
            ImportStatus::PublishFailed => 1,
            ImportStatus::GeneralError => 2,
            ImportStatus::Success => 3,
            ImportStatus::DatasourceError => 6,
            ImportStatus::XmlaCatalogExists => 7,
            ImportStatus::SchemaExists => 8,
            ImportStatus::ContentExists => 9,
            ImportStatus::ProhibitedSymbols => 10,
            ImportStatus::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ImportStatus::PublishFailed,
            2 => ImportStatus::GeneralError,
            3 => ImportStatus::Success,
            6 => ImportStatus::DatasourceError,
            7 => ImportStatus::XmlaCatalogExists,
            8 => ImportStatus::SchemaExists,
            9 => ImportStatus::ContentExists,
            10 => ImportStatus::ProhibitedSymbols,
            other => ImportStatus::Other(other),
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Rejection raised by a [`PlatformImporter`](crate::PlatformImporter).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("import rejected with status {status}: {message}")]
pub struct PlatformImportError {
    pub status: ImportStatus,
    pub message: String,
}

impl PlatformImportError {
    pub fn new(status: ImportStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Failures raised by a [`CatalogRegistry`](crate::CatalogRegistry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("access denied to catalog `{0}`")]
    AccessDenied(String),

    #[error("catalog `{0}` is not registered")]
    NotFound(String),

    #[error("catalog registry failure: {0}")]
    Backend(String),
}

/// Errors returned by the analysis and metadata services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("access denied: administrator capability required")]
    Unauthorized,

    #[error("datasource `{0}` not found")]
    NotFound(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Import(#[from] PlatformImportError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Bundle(#[from] BundleError),
}

impl ServiceError {
    /// Pipeline status carried by an [`ServiceError::Import`] failure.
    ///
    /// ```rust
    /// use datasource::{ImportStatus, PlatformImportError, ServiceError};
    ///
    /// let err = ServiceError::from(PlatformImportError::new(
    ///     ImportStatus::ContentExists,
    ///     "Sales already exists",
    /// ));
    /// assert_eq!(err.import_status(), Some(ImportStatus::ContentExists));
    /// assert_eq!(ServiceError::Unauthorized.import_status(), None);
    /// ```
    pub fn import_status(&self) -> Option<ImportStatus> {
        match self {
            ServiceError::Import(err) => Some(err.status),
            _ => None,
        }
    }

    /// True when the request itself was at fault rather than a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Unauthorized | ServiceError::NotFound(_) | ServiceError::Bundle(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for code in [1, 2, 3, 6, 7, 8, 9, 10, 42] {
            assert_eq!(ImportStatus::from_code(code).code(), code);
        }
        assert_eq!(ImportStatus::from_code(42), ImportStatus::Other(42));
    }

    #[test]
    fn import_error_message_carries_status() {
        let err = ServiceError::from(PlatformImportError::new(
            ImportStatus::ProhibitedSymbols,
            "name contains '/'",
        ));
        assert_eq!(
            err.to_string(),
            "import rejected with status 10: name contains '/'"
        );
        assert!(!err.is_client_error());
    }

    #[test]
    fn bundle_errors_are_client_errors() {
        let err = ServiceError::from(BundleError::MissingDomainId);
        assert!(err.is_client_error());
        assert_eq!(err.import_status(), None);
    }
}
