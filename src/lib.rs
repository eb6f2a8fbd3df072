//! Analysis and metadata datasource services.
//!
//! This crate wraps the schema import core (`import`) with the operations a
//! datasource endpoint exposes: importing, removing, listing and downloading
//! analysis schemas and metadata domains. Authorization, the catalog registry,
//! the content repository and the import pipeline are injected through
//! [`Collaborators`], so the services carry no global state and can be
//! driven entirely by fakes.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use datasource::{
//!     AnalysisService, Collaborators, ImportConfig, InMemoryPlatform, SchemaUpload,
//! };
//!
//! let platform = Arc::new(InMemoryPlatform::default());
//! let service = AnalysisService::new(
//!     Collaborators::from_platform(platform.clone(), Arc::new(|| true)),
//!     ImportConfig::default(),
//! );
//!
//! let upload = SchemaUpload {
//!     overwrite: Some("True".into()),
//!     ..SchemaUpload::new("upload.xml")
//! };
//! let domain_id = service
//!     .put_mondrian_schema(&br#"<Schema name="Sales"/>"#[..], &upload)
//!     .unwrap();
//!
//! assert_eq!(domain_id, "Sales");
//! assert_eq!(service.analysis_datasource_ids().unwrap(), vec!["Sales"]);
//! ```

pub use import::{
    BundleBuilder, BundleError, BundleRequest, ConfigError, IdentitySource, ImportBundle,
    ImportConfig, ParamError, ParameterSet, RepositoryError, ResolvedIdentity, SchemaSource,
    build_bundle, resolve_identity, resolve_overwrite,
};

pub use crate::analysis::{AnalysisService, SchemaUpload, fix_encoded_slash_param};
pub use crate::config::{ConfigLoadError, LoggingConfig, PlatformConfig, ServiceConfig};
pub use crate::error::{ImportStatus, PlatformImportError, RegistryError, ServiceError};
pub use crate::memory::{InMemoryPlatform, METADATA_FILE_NAME, PlatformEvent};
pub use crate::metadata::MetadataService;
pub use crate::ports::{
    AccessPolicy, CatalogEntry, CatalogRegistry, Collaborators, DomainRepository,
    PlatformImporter,
};

mod analysis;
mod config;
mod error;
mod memory;
mod metadata;
mod ports;
