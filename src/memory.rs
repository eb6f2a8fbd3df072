//! In-memory reference platform.
//!
//! [`InMemoryPlatform`] implements every collaborator trait over a single
//! `RwLock`ed state. Analysis bundles become catalogs and metadata bundles
//! become domains, told apart by MIME type. It keeps an ordered log of what
//! happened so callers can check the order of removals and imports.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use import::{ImportBundle, ImportConfig, RepositoryError, SchemaSource};
use serde::Serialize;
use tracing::debug;

use crate::config::PlatformConfig;
use crate::error::{ImportStatus, PlatformImportError, RegistryError};
use crate::ports::{CatalogEntry, CatalogRegistry, DomainRepository, PlatformImporter};

/// File name under which a domain's model is exported.
pub const METADATA_FILE_NAME: &str = "metadata.xmi";

/// One state change on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlatformEvent {
    CatalogRemoved { name: String },
    DomainRemoved { domain_id: String },
    Imported { name: String, mime_type: String },
}

#[derive(Debug, Default)]
struct PlatformState {
    catalogs: BTreeMap<String, ImportBundle>,
    domains: BTreeMap<String, ImportBundle>,
    events: Vec<PlatformEvent>,
}

/// Catalog registry, domain repository and import pipeline in one process.
#[derive(Debug)]
pub struct InMemoryPlatform {
    state: RwLock<PlatformState>,
    import: ImportConfig,
    platform: PlatformConfig,
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new(ImportConfig::default(), PlatformConfig::default())
    }
}

impl InMemoryPlatform {
    pub fn new(import: ImportConfig, platform: PlatformConfig) -> Self {
        Self {
            state: RwLock::new(PlatformState::default()),
            import,
            platform,
        }
    }

    /// Every state change so far, oldest first.
    pub fn events(&self) -> Vec<PlatformEvent> {
        self.read().events.clone()
    }

    /// Bundles currently stored, catalogs first, each group sorted by name.
    pub fn stored_bundles(&self) -> Vec<ImportBundle> {
        let state = self.read();
        state
            .catalogs
            .values()
            .chain(state.domains.values())
            .cloned()
            .collect()
    }

    pub fn catalog(&self, name: &str) -> Option<ImportBundle> {
        self.read().catalogs.get(name).cloned()
    }

    pub fn domain(&self, domain_id: &str) -> Option<ImportBundle> {
        self.read().domains.get(domain_id).cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, PlatformState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PlatformState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_metadata(&self, bundle: &ImportBundle) -> bool {
        bundle.mime_type() == self.import.metadata_mime_type
    }
}

impl CatalogRegistry for InMemoryPlatform {
    fn remove_catalog(&self, name: &str) -> Result<(), RegistryError> {
        let mut state = self.write();
        if state.catalogs.remove(name).is_none() {
            return Err(RegistryError::NotFound(name.to_owned()));
        }
        state.events.push(PlatformEvent::CatalogRemoved {
            name: name.to_owned(),
        });
        debug!(catalog = %name, "catalog removed");
        Ok(())
    }

    fn list_catalogs(&self) -> Result<Vec<CatalogEntry>, RegistryError> {
        Ok(self.read().catalogs.keys().map(CatalogEntry::new).collect())
    }
}

impl SchemaSource for InMemoryPlatform {
    fn schema_files(&self, name: &str) -> Result<HashMap<String, Bytes>, RepositoryError> {
        let state = self.read();
        let bundle = state
            .catalogs
            .get(name)
            .ok_or_else(|| RepositoryError::NotFound(name.to_owned()))?;
        Ok(HashMap::from([(
            self.import.schema_file_name.clone(),
            bundle.payload().clone(),
        )]))
    }
}

impl DomainRepository for InMemoryPlatform {
    fn domain_ids(&self) -> HashSet<String> {
        self.read().domains.keys().cloned().collect()
    }

    fn remove_domain(&self, domain_id: &str) -> Result<(), RepositoryError> {
        let mut state = self.write();
        if state.domains.remove(domain_id).is_none() {
            return Err(RepositoryError::NotFound(domain_id.to_owned()));
        }
        state.events.push(PlatformEvent::DomainRemoved {
            domain_id: domain_id.to_owned(),
        });
        Ok(())
    }

    fn domain_files(&self, domain_id: &str) -> Result<HashMap<String, Bytes>, RepositoryError> {
        let state = self.read();
        let bundle = state
            .domains
            .get(domain_id)
            .ok_or_else(|| RepositoryError::NotFound(domain_id.to_owned()))?;
        Ok(HashMap::from([(
            METADATA_FILE_NAME.to_owned(),
            bundle.payload().clone(),
        )]))
    }
}

impl PlatformImporter for InMemoryPlatform {
    fn import_file(&self, bundle: ImportBundle) -> Result<(), PlatformImportError> {
        let name = bundle.name().to_owned();
        if let Some(symbol) = name
            .chars()
            .find(|c| self.platform.reserved_chars.contains(*c))
        {
            return Err(PlatformImportError::new(
                ImportStatus::ProhibitedSymbols,
                format!("`{name}` contains reserved character {symbol:?}"),
            ));
        }

        let metadata = self.is_metadata(&bundle);
        let mut state = self.write();
        let store = if metadata {
            &mut state.domains
        } else {
            &mut state.catalogs
        };
        if store.contains_key(&name) && !bundle.overwrite() {
            return Err(PlatformImportError::new(
                ImportStatus::ContentExists,
                format!("`{name}` already exists"),
            ));
        }

        let mime_type = bundle.mime_type().to_owned();
        store.insert(name.clone(), bundle);
        state.events.push(PlatformEvent::Imported { name, mime_type });
        Ok(())
    }
}
