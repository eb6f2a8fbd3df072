//! Error types produced by the import crate.
//!
//! Only two kinds of failure leave this crate. [`BundleError`] means a request
//! cannot become an import bundle at all. [`RepositoryError`] is what a
//! [`SchemaSource`](crate::SchemaSource) reports. The builder absorbs it
//! during a metadata-only edit, but callers that download files see it as is.
//!
//! Identity resolution failures never show up here: each resolver step fails
//! soft into the next one.
//!
//! | Error | Raised by | Absorbed? |
//! |-------|-----------|-----------|
//! | [`BundleError::UnresolvedIdentity`] | [`build_bundle`](crate::build_bundle) | no |
//! | [`BundleError::MissingDomainId`] | [`BundleBuilder::build`](crate::BundleBuilder::build) | no |
//! | [`BundleError::PayloadTooLarge`] | [`build_bundle`](crate::build_bundle) | no |
//! | [`RepositoryError`] | [`SchemaSource`](crate::SchemaSource) implementations | during edits |
use thiserror::Error;

/// Errors that prevent an import bundle from being assembled.
///
/// # Examples
///
/// ```rust
/// use import::BundleError;
///
/// let err = BundleError::PayloadTooLarge { size: 20, limit: 16 };
/// assert_eq!(err.to_string(), "payload of 20 bytes exceeds limit of 16");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BundleError {
    /// Schema introspection, the catalog hint and the file name all produced
    /// an empty identity.
    #[error("no domain id could be resolved for upload `{file_name}`")]
    UnresolvedIdentity { file_name: String },

    /// A bundle was requested without a name.
    #[error("domain id is required")]
    MissingDomainId,

    /// The materialized payload is larger than
    /// [`ImportConfig::max_payload_bytes`](crate::ImportConfig::max_payload_bytes).
    #[error("payload of {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// Failures reported by a content repository.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RepositoryError {
    #[error("no stored files for `{0}`")]
    NotFound(String),

    /// The repository cannot export files at all.
    #[error("repository does not support file export")]
    Unsupported,

    #[error("repository failure: {0}")]
    Backend(String),
}
