//! Domain id resolution for uploaded schema documents.
//!
//! The domain id is resolved by an ordered list of steps. Each step either
//! produces a candidate or passes, and the first non-empty candidate wins:
//!
//! 1. [`IdentitySource::SchemaName`]: the `name` attribute of the first
//!    `Schema` element in the document. Used verbatim.
//! 2. [`IdentitySource::CatalogHint`]: `catalogName` from the parameter blob,
//!    or the explicit catalog name when the blob has no such key. Cut at the
//!    first dot.
//! 3. [`IdentitySource::FileName`]: the uploaded file name, cut at the first
//!    dot.
//!
//! Cutting at the *first* dot matches identities already stored
//! (`a.b.xmi` resolves to `a`).
use std::fmt;

use quick_xml::events::attributes::AttrError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::params;

/// Parameter-blob key carrying a catalog name hint.
pub const CATALOG_NAME_KEY: &str = "catalogName";

const SCHEMA_ELEMENT: &[u8] = b"Schema";
const NAME_ATTRIBUTE: &str = "name";

/// Which step produced a [`ResolvedIdentity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    SchemaName,
    CatalogHint,
    FileName,
}

/// A non-empty domain id and the step it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    domain_id: String,
    source: IdentitySource,
}

impl ResolvedIdentity {
    pub fn domain_id(&self) -> &str {
        &self.domain_id
    }

    pub fn source(&self) -> IdentitySource {
        self.source
    }

}

impl fmt::Display for ResolvedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain_id)
    }
}

/// Everything the resolver looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityInputs<'a> {
    /// Raw parameter blob; may be empty.
    pub parameters: &'a str,
    /// Catalog name supplied next to the upload.
    pub catalog_name: Option<&'a str>,
    /// Client-supplied file name.
    pub file_name: &'a str,
    /// Document bytes, possibly empty.
    pub document: &'a [u8],
}

type ResolverStep = fn(&IdentityInputs<'_>) -> Option<String>;

const RESOLVER_STEPS: [(IdentitySource, ResolverStep); 3] = [
    (IdentitySource::SchemaName, schema_name_step),
    (IdentitySource::CatalogHint, catalog_hint_step),
    (IdentitySource::FileName, file_name_step),
];

/// Runs the resolver steps in order and returns the first non-blank id.
///
/// A candidate made only of whitespace counts as empty and falls through to
/// the next step. `None` only when every step came up empty, e.g. an unnamed
/// document uploaded as `.xml` with no hints.
pub fn resolve_identity(inputs: &IdentityInputs<'_>) -> Option<ResolvedIdentity> {
    RESOLVER_STEPS.iter().find_map(|&(source, step)| {
        let domain_id = step(inputs).filter(|id| !id.trim().is_empty())?;
        debug!(domain_id = %domain_id, source = ?source, "domain id resolved");
        Some(ResolvedIdentity { domain_id, source })
    })
}

/// Text before the first `.`, or the whole name when there is none.
pub fn strip_extension(name: &str) -> &str {
    name.split_once('.').map_or(name, |(stem, _)| stem)
}

fn schema_name_step(inputs: &IdentityInputs<'_>) -> Option<String> {
    match declared_schema_name(inputs.document) {
        Ok(name) => name,
        Err(err) => {
            warn!(error = %err, "schema introspection failed; falling back to hints");
            None
        }
    }
}

fn catalog_hint_step(inputs: &IdentityInputs<'_>) -> Option<String> {
    // A catalogName key in the blob shadows the explicit name, even when empty.
    let hint = params::get_value(inputs.parameters, CATALOG_NAME_KEY)
        .or_else(|| inputs.catalog_name.map(str::to_owned))?;
    Some(strip_extension(&hint).to_owned())
}

fn file_name_step(inputs: &IdentityInputs<'_>) -> Option<String> {
    Some(strip_extension(inputs.file_name).to_owned())
}

/// Reasons the document could not be introspected.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaProbeError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("document has no root element")]
    EmptyDocument,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("document ends inside an open element")]
    UnclosedElement,

    #[error("Schema element has no name attribute")]
    MissingName,
}

/// Reads the `name` attribute of the first element whose local name is
/// `Schema`.
///
/// The whole document must be well formed, so a valid `Schema` element
/// followed by broken markup is still an error.
pub fn declared_schema_name(document: &[u8]) -> Result<Option<String>, SchemaProbeError> {
    let mut reader = Reader::from_reader(document);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut roots = 0usize;
    let mut name = None;

    loop {
        let (element, opens) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        if depth == 0 {
            roots += 1;
            if roots > 1 {
                return Err(SchemaProbeError::MultipleRoots);
            }
        }
        if name.is_none() && element.local_name().as_ref() == SCHEMA_ELEMENT {
            let attribute = element
                .try_get_attribute(NAME_ATTRIBUTE)?
                .ok_or(SchemaProbeError::MissingName)?;
            name = Some(attribute.unescape_value()?.into_owned());
        }
        if opens {
            depth += 1;
        }
    }

    if roots == 0 {
        return Err(SchemaProbeError::EmptyDocument);
    }
    if depth != 0 {
        return Err(SchemaProbeError::UnclosedElement);
    }
    Ok(name)
}
