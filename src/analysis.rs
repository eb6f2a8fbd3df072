//! Analysis (OLAP schema) datasources.
//!
//! [`AnalysisService`] is the produced surface for schema uploads: import,
//! removal, listing and download. Every decision about names, flags and
//! parameters is made by the `import` crate; this module adds the access
//! check, rename handling and the calls out to the registry and pipeline.
use std::collections::HashMap;
use std::io::Read;
use std::time::Instant;

use bytes::Bytes;
use import::{build_bundle, resolve_overwrite, BundleRequest, ImportBundle, ImportConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn, Level};

use crate::error::ServiceError;
use crate::ports::Collaborators;

/// Everything that arrives next to an uploaded schema document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaUpload {
    /// Client-supplied file name of the document.
    pub file_name: String,
    /// Catalog the upload targets. With an empty document this marks a
    /// metadata-only edit of that catalog.
    pub catalog_name: Option<String>,
    /// Name the catalog was stored under before this edit.
    pub orig_catalog_name: Option<String>,
    pub datasource_name: Option<String>,
    /// Raw overwrite flag, `"true"` in any case means overwrite.
    pub overwrite: Option<String>,
    pub xmla_enabled: Option<String>,
    /// Parameter blob, `key=value;key=value`.
    pub parameters: Option<String>,
}

impl SchemaUpload {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    fn bundle_request(&self, overwrite: bool) -> BundleRequest<'_> {
        BundleRequest {
            parameters: self.parameters.as_deref(),
            catalog_name: self.catalog_name.as_deref(),
            datasource_name: self.datasource_name.as_deref(),
            overwrite,
            file_name: &self.file_name,
            xmla_enabled: self.xmla_enabled.as_deref(),
        }
    }
}

/// Import, removal and listing of analysis datasources.
#[derive(Debug, Clone)]
pub struct AnalysisService {
    collaborators: Collaborators,
    config: ImportConfig,
}

impl AnalysisService {
    pub fn new(collaborators: Collaborators, config: ImportConfig) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    /// Imports a schema document and returns the domain id it was stored
    /// under.
    ///
    /// When `orig_catalog_name` names a different catalog than the one the
    /// upload resolves to, the old catalog is removed before the import. A
    /// failed removal aborts the request and nothing is imported.
    pub fn put_mondrian_schema<R: Read>(
        &self,
        data: R,
        upload: &SchemaUpload,
    ) -> Result<String, ServiceError> {
        let start = Instant::now();
        let span = tracing::span!(
            Level::INFO,
            "analysis.import",
            file_name = %upload.file_name,
            catalog_name = ?upload.catalog_name
        );
        let _guard = span.enter();

        match self.put_mondrian_schema_inner(data, upload) {
            Ok(domain_id) => {
                let elapsed_micros = start.elapsed().as_micros();
                info!(domain_id = %domain_id, elapsed_micros, "analysis_import_success");
                Ok(domain_id)
            }
            Err(err) => {
                let elapsed_micros = start.elapsed().as_micros();
                warn!(
                    error = %err,
                    import_status = ?err.import_status(),
                    elapsed_micros,
                    "analysis_import_failure"
                );
                Err(err)
            }
        }
    }

    fn put_mondrian_schema_inner<R: Read>(
        &self,
        data: R,
        upload: &SchemaUpload,
    ) -> Result<String, ServiceError> {
        self.validate_access()?;

        let document = read_document(data);
        let overwrite = resolve_overwrite(
            upload.overwrite.as_deref(),
            upload.parameters.as_deref().unwrap_or_default(),
        );
        let bundle = build_bundle(
            &upload.bundle_request(overwrite),
            document,
            self.collaborators.schemas.as_ref(),
            &self.config,
        )?;

        self.remove_renamed_catalog(upload.orig_catalog_name.as_deref(), &bundle)?;

        let domain_id = bundle.name().to_owned();
        self.collaborators.importer.import_file(bundle)?;
        Ok(domain_id)
    }

    /// Removes the catalog stored under `orig` when the upload now resolves
    /// to another name. Runs before the import so the registry never holds
    /// both names.
    fn remove_renamed_catalog(
        &self,
        orig: Option<&str>,
        bundle: &ImportBundle,
    ) -> Result<(), ServiceError> {
        let Some(orig) = orig.filter(|name| !name.is_empty()) else {
            return Ok(());
        };
        if orig == bundle.name() {
            return Ok(());
        }
        info!(from = %orig, to = %bundle.name(), "catalog renamed; removing old entry");
        self.collaborators.catalogs.remove_catalog(orig)?;
        Ok(())
    }

    /// Removes the catalog registered under `analysis_id`.
    pub fn remove_analysis(&self, analysis_id: &str) -> Result<(), ServiceError> {
        let start = Instant::now();
        let span = tracing::span!(Level::INFO, "analysis.remove", analysis_id = %analysis_id);
        let _guard = span.enter();

        let result = self.validate_access().and_then(|()| {
            let encoded = fix_encoded_slash_param(analysis_id);
            self.collaborators
                .catalogs
                .remove_catalog(&encoded)
                .map_err(ServiceError::from)
        });

        let elapsed_micros = start.elapsed().as_micros();
        match &result {
            Ok(()) => info!(elapsed_micros, "analysis_remove_success"),
            Err(err) => warn!(error = %err, elapsed_micros, "analysis_remove_failure"),
        }
        result
    }

    /// Names of registered catalogs, minus those shadowed by a metadata
    /// domain called `<name><metadata_extension>`. Registry order is kept.
    pub fn analysis_datasource_ids(&self) -> Result<Vec<String>, ServiceError> {
        let domain_ids = self.collaborators.domains.domain_ids();
        let catalogs = self.collaborators.catalogs.list_catalogs()?;

        let ids: Vec<String> = catalogs
            .into_iter()
            .filter(|entry| !domain_ids.contains(&self.config.metadata_domain_id(&entry.name)))
            .map(|entry| entry.name)
            .collect();
        debug!(count = ids.len(), "listed analysis datasources");
        Ok(ids)
    }

    /// Stored schema files of `analysis_id`, keyed by file name.
    pub fn analysis_files_for_download(
        &self,
        analysis_id: &str,
    ) -> Result<HashMap<String, Bytes>, ServiceError> {
        self.validate_access()?;
        let files = self.collaborators.schemas.schema_files(analysis_id)?;
        if files.is_empty() {
            return Err(ServiceError::NotFound(analysis_id.to_owned()));
        }
        debug!(analysis_id = %analysis_id, files = files.len(), "prepared analysis download");
        Ok(files)
    }

    fn validate_access(&self) -> Result<(), ServiceError> {
        if self.collaborators.access.can_administer() {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized)
        }
    }
}

/// Re-encodes slashes the way stored identities encode them.
///
/// ```rust
/// use datasource::fix_encoded_slash_param;
///
/// assert_eq!(fix_encoded_slash_param(r"a/b\c"), "a%2Fb%5Cc");
/// assert_eq!(fix_encoded_slash_param("plain"), "plain");
/// ```
pub fn fix_encoded_slash_param(param: &str) -> String {
    param.replace('\\', "%5C").replace('/', "%2F")
}

/// Reads the whole upload. A failed read counts as an empty upload; the
/// pipeline rejects the result if it cannot use it.
pub(crate) fn read_document<R: Read>(mut data: R) -> Vec<u8> {
    let mut document = Vec::new();
    if let Err(err) = data.read_to_end(&mut document) {
        warn!(error = %err, read = document.len(), "upload read failed; treating as empty");
        document.clear();
    }
    document
}
