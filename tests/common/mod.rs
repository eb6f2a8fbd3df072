#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use datasource::{
    CatalogEntry, CatalogRegistry, Collaborators, DomainRepository, ImportBundle, ImportStatus,
    PlatformImportError, PlatformImporter, RegistryError, RepositoryError, SchemaSource,
};

/// Calls seen by the fakes, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RemoveCatalog(String),
    ListCatalogs,
    SchemaFiles(String),
    DomainIds,
    RemoveDomain(String),
    DomainFiles(String),
    Import(String),
}

pub type Journal = Arc<RwLock<Vec<Call>>>;

fn record(journal: &Journal, call: Call) {
    journal.write().unwrap().push(call);
}

#[derive(Default)]
pub struct FakeCatalogs {
    pub journal: Journal,
    pub names: Vec<String>,
    pub fail_removal: bool,
}

impl CatalogRegistry for FakeCatalogs {
    fn remove_catalog(&self, name: &str) -> Result<(), RegistryError> {
        record(&self.journal, Call::RemoveCatalog(name.to_string()));
        if self.fail_removal {
            return Err(RegistryError::AccessDenied(name.to_string()));
        }
        Ok(())
    }

    fn list_catalogs(&self) -> Result<Vec<CatalogEntry>, RegistryError> {
        record(&self.journal, Call::ListCatalogs);
        Ok(self.names.iter().map(CatalogEntry::new).collect())
    }
}

#[derive(Default)]
pub struct FakeRepository {
    pub journal: Journal,
    pub schemas: HashMap<String, HashMap<String, Bytes>>,
    pub domains: HashMap<String, HashMap<String, Bytes>>,
}

impl SchemaSource for FakeRepository {
    fn schema_files(&self, name: &str) -> Result<HashMap<String, Bytes>, RepositoryError> {
        record(&self.journal, Call::SchemaFiles(name.to_string()));
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))
    }
}

impl DomainRepository for FakeRepository {
    fn domain_ids(&self) -> HashSet<String> {
        record(&self.journal, Call::DomainIds);
        self.domains.keys().cloned().collect()
    }

    fn remove_domain(&self, domain_id: &str) -> Result<(), RepositoryError> {
        record(&self.journal, Call::RemoveDomain(domain_id.to_string()));
        Ok(())
    }

    fn domain_files(&self, domain_id: &str) -> Result<HashMap<String, Bytes>, RepositoryError> {
        record(&self.journal, Call::DomainFiles(domain_id.to_string()));
        Ok(self.domains.get(domain_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeImporter {
    pub journal: Journal,
    pub bundles: RwLock<Vec<ImportBundle>>,
    pub reject_with: Option<ImportStatus>,
}

impl FakeImporter {
    pub fn bundles(&self) -> Vec<ImportBundle> {
        self.bundles.read().unwrap().clone()
    }
}

impl PlatformImporter for FakeImporter {
    fn import_file(&self, bundle: ImportBundle) -> Result<(), PlatformImportError> {
        record(&self.journal, Call::Import(bundle.name().to_string()));
        if let Some(status) = self.reject_with {
            return Err(PlatformImportError::new(status, "rejected by fake"));
        }
        self.bundles.write().unwrap().push(bundle);
        Ok(())
    }
}

/// A full set of fakes sharing one journal.
pub struct Harness {
    pub journal: Journal,
    pub catalogs: Arc<FakeCatalogs>,
    pub repository: Arc<FakeRepository>,
    pub importer: Arc<FakeImporter>,
    pub allowed: bool,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(FakeCatalogs::default(), FakeRepository::default(), FakeImporter::default())
    }

    pub fn with(catalogs: FakeCatalogs, repository: FakeRepository, importer: FakeImporter) -> Self {
        let journal = Journal::default();
        Self {
            catalogs: Arc::new(FakeCatalogs {
                journal: journal.clone(),
                ..catalogs
            }),
            repository: Arc::new(FakeRepository {
                journal: journal.clone(),
                ..repository
            }),
            importer: Arc::new(FakeImporter {
                journal: journal.clone(),
                ..importer
            }),
            journal,
            allowed: true,
        }
    }

    pub fn denied(mut self) -> Self {
        self.allowed = false;
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        let allowed = self.allowed;
        Collaborators {
            access: Arc::new(move || allowed),
            catalogs: self.catalogs.clone(),
            schemas: self.repository.clone(),
            domains: self.repository.clone(),
            importer: self.importer.clone(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.journal.read().unwrap().clone()
    }
}

pub fn single_file(name: &str, bytes: &[u8]) -> HashMap<String, Bytes> {
    HashMap::from([(name.to_string(), Bytes::copy_from_slice(bytes))])
}
