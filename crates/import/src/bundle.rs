//! Import bundle assembly.
//!
//! An [`ImportBundle`] is the finished request handed to the import pipeline:
//! payload, resolved name, declared MIME type and charset, overwrite flag and a
//! few named parameters. [`build_bundle`] turns a raw upload into one.
use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::config::ImportConfig;
use crate::error::{BundleError, RepositoryError};
use crate::identity::{resolve_identity, IdentityInputs};
use crate::params;

/// Bundle parameter holding the serialized parameter blob.
pub const PARAMETERS_KEY: &str = "parameters";
/// Bundle parameter holding the resolved domain id.
pub const DOMAIN_ID_KEY: &str = "domain-id";
/// Bundle parameter and blob key for the XMLA-enabled flag.
pub const ENABLE_XMLA_KEY: &str = "EnableXmla";
/// Blob key for the datasource name of a synthesized parameter blob.
pub const DATASOURCE_NAME_KEY: &str = "datasourceName";

/// Read access to previously stored schema files.
pub trait SchemaSource: Send + Sync {
    /// Files stored under `name`, keyed by logical file name
    /// (e.g. `schema.xml`).
    fn schema_files(&self, name: &str) -> Result<HashMap<String, Bytes>, RepositoryError>;
}

/// A fully resolved import request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportBundle {
    name: String,
    #[serde(rename = "payload_len", serialize_with = "serialize_len")]
    payload: Bytes,
    charset: String,
    mime_type: String,
    hidden: bool,
    overwrite: bool,
    params: BTreeMap<String, String>,
}

impl ImportBundle {
    pub fn builder(name: impl Into<String>) -> BundleBuilder {
        BundleBuilder::new(name)
    }

    /// Stored file name, which is also the domain id.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

}

fn serialize_len<S: Serializer>(payload: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(payload.len() as u64)
}

/// Step-by-step construction of an [`ImportBundle`].
///
/// ```rust
/// use import::ImportBundle;
///
/// let bundle = ImportBundle::builder("steel-wheels")
///     .payload(&b"<xmi/>"[..])
///     .charset("UTF-8")
///     .mime_type("text/xmi+xml")
///     .overwrite(true)
///     .param("domain-id", "steel-wheels")
///     .build()
///     .unwrap();
/// assert_eq!(bundle.param("domain-id"), Some("steel-wheels"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BundleBuilder {
    name: String,
    payload: Bytes,
    charset: String,
    mime_type: String,
    hidden: bool,
    overwrite: bool,
    params: BTreeMap<String, String>,
}

impl BundleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<ImportBundle, BundleError> {
        if self.name.trim().is_empty() {
            return Err(BundleError::MissingDomainId);
        }
        Ok(ImportBundle {
            name: self.name,
            payload: self.payload,
            charset: self.charset,
            mime_type: self.mime_type,
            hidden: self.hidden,
            overwrite: self.overwrite,
            params: self.params,
        })
    }
}

/// Caller-supplied hints for one analysis import.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleRequest<'a> {
    /// Inbound parameter blob. Empty or absent means "synthesize one".
    pub parameters: Option<&'a str>,
    /// Explicit catalog name; with an empty payload it also marks a
    /// metadata-only edit of that catalog.
    pub catalog_name: Option<&'a str>,
    /// Datasource name written into a synthesized blob.
    pub datasource_name: Option<&'a str>,
    /// Already reconciled overwrite flag.
    pub overwrite: bool,
    pub file_name: &'a str,
    pub xmla_enabled: Option<&'a str>,
}

/// Builds the bundle for an analysis schema upload.
///
/// An empty `document` together with a catalog name is a metadata-only edit:
/// the stored schema of that catalog is fetched from `source` and used
/// instead. Fetch failures are logged and leave the payload empty.
pub fn build_bundle(
    request: &BundleRequest<'_>,
    document: Vec<u8>,
    source: &dyn SchemaSource,
    cfg: &ImportConfig,
) -> Result<ImportBundle, BundleError> {
    let payload = match request.catalog_name.filter(|name| !name.is_empty()) {
        Some(catalog) if document.is_empty() => stored_schema(source, catalog, cfg),
        _ => Bytes::from(document),
    };

    if let Some(limit) = cfg.max_payload_bytes {
        if payload.len() > limit {
            return Err(BundleError::PayloadTooLarge {
                size: payload.len(),
                limit,
            });
        }
    }

    let parameters = request.parameters.unwrap_or_default();
    let identity = resolve_identity(&IdentityInputs {
        parameters,
        catalog_name: request.catalog_name,
        file_name: request.file_name,
        document: &payload[..],
    })
    .ok_or_else(|| BundleError::UnresolvedIdentity {
        file_name: request.file_name.to_owned(),
    })?;

    let xmla_enabled = request.xmla_enabled.filter(|flag| !flag.is_empty());
    let parameters = if parameters.trim().is_empty() {
        let datasource = request
            .datasource_name
            .filter(|name| !name.is_empty())
            .unwrap_or(identity.domain_id());
        synthesize_parameters(datasource, xmla_enabled)
    } else {
        parameters.to_owned()
    };

    let payload_len = payload.len();
    let mut builder = ImportBundle::builder(identity.domain_id())
        .payload(payload)
        .charset(cfg.charset.as_str())
        .mime_type(cfg.analysis_mime_type.as_str())
        .hidden(false)
        .overwrite(request.overwrite)
        .param(PARAMETERS_KEY, parameters)
        .param(DOMAIN_ID_KEY, identity.domain_id());
    // Also kept inside the blob; downstream readers look in both places.
    if let Some(flag) = xmla_enabled {
        builder = builder.param(ENABLE_XMLA_KEY, flag);
    }
    let bundle = builder.build()?;

    info!(
        domain_id = %identity,
        source = ?identity.source(),
        overwrite = request.overwrite,
        payload_len,
        "bundle_built"
    );
    Ok(bundle)
}

fn synthesize_parameters(datasource: &str, xmla_enabled: Option<&str>) -> String {
    let blob = params::append("", DATASOURCE_NAME_KEY, datasource);
    match xmla_enabled {
        Some(flag) => params::append(&blob, ENABLE_XMLA_KEY, flag),
        None => blob,
    }
}

fn stored_schema(source: &dyn SchemaSource, catalog: &str, cfg: &ImportConfig) -> Bytes {
    match source.schema_files(catalog) {
        Ok(mut files) => match files.remove(&cfg.schema_file_name) {
            Some(bytes) => {
                debug!(catalog = %catalog, len = bytes.len(), "reusing stored schema");
                bytes
            }
            None => {
                warn!(
                    catalog = %catalog,
                    file = %cfg.schema_file_name,
                    "stored schema file missing; continuing with empty payload"
                );
                Bytes::new()
            }
        },
        Err(err) => {
            warn!(
                catalog = %catalog,
                error = %err,
                "stored schema unavailable; continuing with empty payload"
            );
            Bytes::new()
        }
    }
}
