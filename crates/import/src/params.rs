//! Connect-string style parameter blobs.
//!
//! Import requests carry free-form hints as `key=value` pairs separated by
//! `;`, the same grammar the query engine uses for connection strings:
//!
//! ```text
//! Provider=mondrian;DataSource=Pentaho;catalogName='Sales;2024'
//! ```
//!
//! - Keys are trimmed and looked up case-insensitively. A literal `=` inside a
//!   key is written `==`.
//! - Unquoted values run to the next `;` and are trimmed.
//! - Values may be wrapped in `'` or `"`; the quote character is escaped by
//!   doubling it. Quoted values keep their inner whitespace and may contain `;`.
//! - Empty segments (`;;`, a trailing `;`) are ignored. A repeated key replaces
//!   the earlier value in place.
//!
//! [`ParameterSet::parse`] never fails: a blob that does not follow the grammar
//! is treated as carrying no parameters at all. Use
//! [`ParameterSet::try_parse`] when the grammar error itself matters.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

/// Key of the provider marker that starts every synthesized blob.
pub const PROVIDER_KEY: &str = "Provider";
/// Provider value written when a blob is synthesized from scratch.
pub const DEFAULT_PROVIDER: &str = "mondrian";

/// Grammar violations reported by [`ParameterSet::try_parse`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParamError {
    /// A segment ended before its `=` separator.
    #[error("parameter `{key}` has no '=' separator")]
    MissingEquals { key: String },

    /// A segment starts with `=`.
    #[error("empty parameter key at offset {offset}")]
    EmptyKey { offset: usize },

    /// A quoted value was never closed.
    #[error("unterminated quoted value for parameter `{key}`")]
    UnterminatedQuote { key: String },

    /// Something other than `;` follows a closing quote.
    #[error("unexpected text after quoted value for parameter `{key}`")]
    TrailingCharacters { key: String },
}

/// Ordered, case-insensitive view over a parameter blob.
///
/// Insertion order is kept so that [`Display`](fmt::Display) output is
/// deterministic and mirrors the order keys were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<(String, String)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `blob`, yielding an empty set when it does not follow the grammar.
    pub fn parse(blob: &str) -> Self {
        match Self::try_parse(blob) {
            Ok(set) => set,
            Err(err) => {
                debug!(error = %err, "parameter blob ignored");
                Self::new()
            }
        }
    }

    /// Parses `blob`, reporting the first grammar violation.
    pub fn try_parse(blob: &str) -> Result<Self, ParamError> {
        let chars: Vec<char> = blob.chars().collect();
        let mut pos = 0;
        let mut set = Self::new();

        while let Some(key) = read_key(&chars, &mut pos)? {
            let value = read_value(&chars, &mut pos, &key)?;
            set.set(key, value);
        }

        Ok(set)
    }

    /// Returns the value stored under `key`, compared case-insensitively.
    ///
    /// `None` means the key was not supplied; `Some("")` means it was supplied
    /// with an empty value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces `key`. A replaced key keeps its position but takes
    /// the new spelling.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(entry) => *entry = (key, value),
            None => self.entries.push((key, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for ParameterSet {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write_pair(f, key, value)?;
        }
        Ok(())
    }
}

/// Looks up a single key in a raw blob. Unparsable blobs have no keys.
pub fn get_value(blob: &str, key: &str) -> Option<String> {
    ParameterSet::parse(blob).get(key).map(str::to_owned)
}

/// Appends `key=value` to `blob`.
///
/// Starting from an empty blob, the result always begins with
/// `Provider=mondrian`. Existing text is kept verbatim.
pub fn append(blob: &str, key: &str, value: &str) -> String {
    let mut out = if blob.trim().is_empty() {
        format!("{PROVIDER_KEY}={DEFAULT_PROVIDER}")
    } else {
        blob.trim_end().to_owned()
    };
    if !out.ends_with(';') {
        out.push(';');
    }
    // Writing into a String cannot fail.
    let _ = write_pair(&mut out, key, value);
    out
}

fn write_pair(out: &mut impl fmt::Write, key: &str, value: &str) -> fmt::Result {
    out.write_str(&key.replace('=', "=="))?;
    out.write_char('=')?;
    if needs_quoting(value) {
        write!(out, "'{}'", value.replace('\'', "''"))
    } else {
        out.write_str(value)
    }
}

fn needs_quoting(value: &str) -> bool {
    value.contains(';') || value.starts_with(['\'', '"']) || value.trim() != value
}

fn read_key(chars: &[char], pos: &mut usize) -> Result<Option<String>, ParamError> {
    let mut key = String::new();
    while let Some(&c) = chars.get(*pos) {
        *pos += 1;
        match c {
            '=' if chars.get(*pos) == Some(&'=') => {
                key.push('=');
                *pos += 1;
            }
            '=' => {
                let trimmed = key.trim();
                if trimmed.is_empty() {
                    return Err(ParamError::EmptyKey { offset: *pos - 1 });
                }
                return Ok(Some(trimmed.to_owned()));
            }
            ';' if key.trim().is_empty() => key.clear(),
            ';' => {
                return Err(ParamError::MissingEquals {
                    key: key.trim().to_owned(),
                })
            }
            _ => key.push(c),
        }
    }

    if key.trim().is_empty() {
        Ok(None)
    } else {
        Err(ParamError::MissingEquals {
            key: key.trim().to_owned(),
        })
    }
}

fn read_value(chars: &[char], pos: &mut usize, key: &str) -> Result<String, ParamError> {
    skip_whitespace(chars, pos);

    let quote = match chars.get(*pos) {
        Some(&c) if c == '\'' || c == '"' => c,
        _ => {
            let mut value = String::new();
            while let Some(&c) = chars.get(*pos) {
                *pos += 1;
                if c == ';' {
                    break;
                }
                value.push(c);
            }
            return Ok(value.trim().to_owned());
        }
    };

    *pos += 1;
    let mut value = String::new();
    loop {
        match chars.get(*pos) {
            None => {
                return Err(ParamError::UnterminatedQuote {
                    key: key.to_owned(),
                })
            }
            Some(&c) if c == quote => {
                if chars.get(*pos + 1) == Some(&quote) {
                    value.push(quote);
                    *pos += 2;
                } else {
                    *pos += 1;
                    break;
                }
            }
            Some(&c) => {
                value.push(c);
                *pos += 1;
            }
        }
    }

    skip_whitespace(chars, pos);
    match chars.get(*pos) {
        None => {}
        Some(';') => *pos += 1,
        Some(_) => {
            return Err(ParamError::TrailingCharacters {
                key: key.to_owned(),
            })
        }
    }
    Ok(value)
}

fn skip_whitespace(chars: &[char], pos: &mut usize) {
    while chars.get(*pos).is_some_and(|c| c.is_whitespace()) {
        *pos += 1;
    }
}
