//! Schema Import Core
//!
//! Turns a raw uploaded OLAP schema, plus whatever hints came with it, into a
//! well-formed import bundle with a resolved, stable name. Nothing in here
//! talks to a registry or writes to storage; the services in the parent crate
//! do that with the bundles built here.
//!
//! ## What we do here
//!
//! - **Parse parameter blobs** - `key=value;key=value` connection-string style
//!   hints. Unparsable input just means "no hints".
//! - **Reconcile the overwrite flag** - An explicit flag can be overridden by an
//!   `overwrite` key in the parameters, never the other way round.
//! - **Resolve the domain id** - The schema's own `name` attribute first, then
//!   the catalog hint, then the file name. Each step fails soft into the next.
//! - **Assemble the bundle** - Payload, charset, MIME type, overwrite flag and
//!   the `parameters` / `domain-id` / `EnableXmla` named parameters. An empty
//!   upload for a known catalog reuses the stored schema.
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//!
//! use bytes::Bytes;
//! use import::{
//!     build_bundle, resolve_overwrite, BundleRequest, ImportConfig, RepositoryError,
//!     SchemaSource,
//! };
//!
//! struct NoStoredSchemas;
//!
//! impl SchemaSource for NoStoredSchemas {
//!     fn schema_files(&self, name: &str) -> Result<HashMap<String, Bytes>, RepositoryError> {
//!         Err(RepositoryError::NotFound(name.to_string()))
//!     }
//! }
//!
//! let overwrite = resolve_overwrite(Some("True"), "");
//! let request = BundleRequest {
//!     overwrite,
//!     file_name: "upload.xml",
//!     ..Default::default()
//! };
//! let bundle = build_bundle(
//!     &request,
//!     br#"<Schema name="Sales"/>"#.to_vec(),
//!     &NoStoredSchemas,
//!     &ImportConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(bundle.name(), "Sales");
//! assert!(bundle.overwrite());
//! assert_eq!(
//!     bundle.param("parameters"),
//!     Some("Provider=mondrian;datasourceName=Sales")
//! );
//! ```
mod bundle;
mod config;
mod error;
mod identity;
mod overwrite;
mod params;

pub use crate::bundle::{
    build_bundle, BundleBuilder, BundleRequest, ImportBundle, SchemaSource, DATASOURCE_NAME_KEY,
    DOMAIN_ID_KEY, ENABLE_XMLA_KEY, PARAMETERS_KEY,
};
pub use crate::config::{ConfigError, ImportConfig};
pub use crate::error::{BundleError, RepositoryError};
pub use crate::identity::{
    declared_schema_name, resolve_identity, strip_extension, IdentityInputs, IdentitySource,
    ResolvedIdentity, SchemaProbeError, CATALOG_NAME_KEY,
};
pub use crate::overwrite::{resolve_overwrite, OVERWRITE_KEY};
pub use crate::params::{
    append, get_value, ParamError, ParameterSet, DEFAULT_PROVIDER, PROVIDER_KEY,
};
