//! Collaborator seams of the datasource services.
//!
//! Every external system the services touch sits behind one of these traits
//! and is injected at construction through [`Collaborators`]. The services
//! hold no global state of their own.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use import::{ImportBundle, RepositoryError, SchemaSource};
use serde::Serialize;

use crate::error::{PlatformImportError, RegistryError};

/// Capability check run once at the start of every guarded operation.
pub trait AccessPolicy: Send + Sync {
    /// True when the current caller may create, replace or delete
    /// datasources. Must not have side effects.
    fn can_administer(&self) -> bool;
}

impl<F> AccessPolicy for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn can_administer(&self) -> bool {
        self()
    }
}

/// A catalog registered with the query engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CatalogEntry {
    pub name: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Registry of OLAP catalogs.
pub trait CatalogRegistry: Send + Sync {
    fn remove_catalog(&self, name: &str) -> Result<(), RegistryError>;

    fn list_catalogs(&self) -> Result<Vec<CatalogEntry>, RegistryError>;
}

/// Registry of metadata domains.
pub trait DomainRepository: Send + Sync {
    fn domain_ids(&self) -> HashSet<String>;

    fn remove_domain(&self, domain_id: &str) -> Result<(), RepositoryError>;

    /// Files stored for a metadata domain, keyed by file name.
    fn domain_files(&self, domain_id: &str) -> Result<HashMap<String, Bytes>, RepositoryError>;
}

/// The import pipeline. Consumes a finished bundle.
pub trait PlatformImporter: Send + Sync {
    fn import_file(&self, bundle: ImportBundle) -> Result<(), PlatformImportError>;
}

/// Everything a service needs from the outside world.
#[derive(Clone)]
pub struct Collaborators {
    pub access: Arc<dyn AccessPolicy>,
    pub catalogs: Arc<dyn CatalogRegistry>,
    pub schemas: Arc<dyn SchemaSource>,
    pub domains: Arc<dyn DomainRepository>,
    pub importer: Arc<dyn PlatformImporter>,
}

impl Collaborators {
    /// Wires every seam to one object implementing all of them, e.g.
    /// [`InMemoryPlatform`](crate::InMemoryPlatform).
    pub fn from_platform<P>(platform: Arc<P>, access: Arc<dyn AccessPolicy>) -> Self
    where
        P: CatalogRegistry + SchemaSource + DomainRepository + PlatformImporter + 'static,
    {
        Self {
            access,
            catalogs: platform.clone(),
            schemas: platform.clone(),
            domains: platform.clone(),
            importer: platform,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
