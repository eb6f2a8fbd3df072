//! Metadata domain datasources.
use std::collections::HashMap;
use std::io::Read;
use std::time::Instant;

use bytes::Bytes;
use import::{resolve_overwrite, BundleError, ImportBundle, ImportConfig, DOMAIN_ID_KEY};
use tracing::{debug, info, warn, Level};

use crate::analysis::{fix_encoded_slash_param, read_document};
use crate::error::ServiceError;
use crate::ports::Collaborators;

/// Import, removal and listing of metadata domains.
#[derive(Debug, Clone)]
pub struct MetadataService {
    collaborators: Collaborators,
    config: ImportConfig,
}

impl MetadataService {
    pub fn new(collaborators: Collaborators, config: ImportConfig) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    /// Imports a metadata model under `domain_id`.
    ///
    /// The overwrite flag follows the same rule as schema uploads, with no
    /// parameter blob to override it.
    pub fn import_metadata<R: Read>(
        &self,
        domain_id: &str,
        data: R,
        overwrite: Option<&str>,
    ) -> Result<(), ServiceError> {
        let start = Instant::now();
        let span = tracing::span!(Level::INFO, "metadata.import", domain_id = %domain_id);
        let _guard = span.enter();

        match self.import_metadata_inner(domain_id, data, overwrite) {
            Ok(()) => {
                let elapsed_micros = start.elapsed().as_micros();
                info!(elapsed_micros, "metadata_import_success");
                Ok(())
            }
            Err(err) => {
                let elapsed_micros = start.elapsed().as_micros();
                warn!(
                    error = %err,
                    import_status = ?err.import_status(),
                    elapsed_micros,
                    "metadata_import_failure"
                );
                Err(err)
            }
        }
    }

    fn import_metadata_inner<R: Read>(
        &self,
        domain_id: &str,
        data: R,
        overwrite: Option<&str>,
    ) -> Result<(), ServiceError> {
        self.validate_access()?;

        let document = read_document(data);
        if let Some(limit) = self.config.max_payload_bytes {
            if document.len() > limit {
                return Err(BundleError::PayloadTooLarge {
                    size: document.len(),
                    limit,
                }
                .into());
            }
        }

        let bundle = ImportBundle::builder(domain_id)
            .payload(document)
            .charset(self.config.charset.as_str())
            .mime_type(self.config.metadata_mime_type.as_str())
            .hidden(false)
            .overwrite(resolve_overwrite(overwrite, ""))
            .param(DOMAIN_ID_KEY, domain_id)
            .build()?;

        self.collaborators.importer.import_file(bundle)?;
        Ok(())
    }

    /// Removes the metadata domain `metadata_id`.
    pub fn remove_metadata(&self, metadata_id: &str) -> Result<(), ServiceError> {
        let start = Instant::now();
        let span = tracing::span!(Level::INFO, "metadata.remove", metadata_id = %metadata_id);
        let _guard = span.enter();

        let result = self.validate_access().and_then(|()| {
            let encoded = fix_encoded_slash_param(metadata_id);
            self.collaborators
                .domains
                .remove_domain(&encoded)
                .map_err(ServiceError::from)
        });

        let elapsed_micros = start.elapsed().as_micros();
        match &result {
            Ok(()) => info!(elapsed_micros, "metadata_remove_success"),
            Err(err) => warn!(error = %err, elapsed_micros, "metadata_remove_failure"),
        }
        result
    }

    /// Every registered metadata domain id, sorted.
    pub fn metadata_datasource_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.collaborators.domains.domain_ids().into_iter().collect();
        ids.sort_unstable();
        ids
    }

    /// Files stored for `metadata_id`, keyed by file name.
    pub fn metadata_files_for_download(
        &self,
        metadata_id: &str,
    ) -> Result<HashMap<String, Bytes>, ServiceError> {
        self.validate_access()?;
        let files = self.collaborators.domains.domain_files(metadata_id)?;
        if files.is_empty() {
            return Err(ServiceError::NotFound(metadata_id.to_owned()));
        }
        debug!(metadata_id = %metadata_id, files = files.len(), "prepared metadata download");
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
