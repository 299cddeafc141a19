//! Content references.
//!
//! On-chain records point at off-chain documents with strings such as
//! `ipfs://bafy...`, `/ipfs/Qm...` or a bare CID. [`ContentRef`] strips the
//! scheme once so every cache and gateway sees the same bare identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::CONTENT_REF_PREFIXES;
use crate::error::{GleanerError, Result};

/// A normalized content reference.
///
/// Holds the bare CID (optionally followed by a path inside the DAG, e.g.
/// `bafy.../metadata.json`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentRef {
    cid: String,
}

impl ContentRef {
    /// Parses a raw reference, stripping any known scheme prefix.
    ///
    /// Gateway URLs (`https://<host>/ipfs/<cid>`) are reduced to the text
    /// after `/ipfs/`, without query or fragment.
    ///
    /// # Errors
    ///
    /// Returns [`GleanerError::InvalidReference`] for empty input, HTTP URLs
    /// without an `/ipfs/` path, characters that cannot appear in a CID path,
    /// or empty, `.` and `..` path segments.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();

        let bare = match Self::strip_gateway_url(trimmed) {
            Some(stripped) => stripped?,
            None => CONTENT_REF_PREFIXES
                .iter()
                .find_map(|prefix| trimmed.strip_prefix(prefix))
                .unwrap_or(trimmed),
        }
        .trim_matches('/');

        if bare.is_empty() {
            return Err(GleanerError::InvalidReference(
                "reference cannot be empty".into(),
            ));
        }

        if bare.contains("://") {
            return Err(GleanerError::InvalidReference(format!(
                "unsupported scheme: {}",
                raw
            )));
        }

        if !bare
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_'))
        {
            return Err(GleanerError::InvalidReference(format!(
                "reference contains invalid characters: {}",
                raw
            )));
        }

        if bare
            .split('/')
            .any(|segment| matches!(segment, "" | "." | ".."))
        {
            return Err(GleanerError::InvalidReference(format!(
                "reference contains an empty or relative path segment: {}",
                raw
            )));
        }

        Ok(Self {
            cid: bare.to_string(),
        })
    }

    /// Returns `None` if `raw` is not an HTTP(S) URL, otherwise the part
    /// of a `/ipfs/...` path after the prefix, with query and fragment removed.
    fn strip_gateway_url(raw: &str) -> Option<Result<&str>> {
        let lower = raw.get(..8).unwrap_or(raw).to_ascii_lowercase();
        if !lower.starts_with("http://") && !lower.starts_with("https://") {
            return None;
        }

        let after_scheme = raw.split_once("://").map_or(raw, |(_, rest)| rest);
        let path = after_scheme
            .find('/')
            .map_or("", |start| &after_scheme[start..]);
        let path = &path[..path.find(['?', '#']).unwrap_or(path.len())];

        Some(path.strip_prefix("/ipfs/").ok_or_else(|| {
            GleanerError::InvalidReference(format!("URL is not a gateway path: {}", raw))
        }))
    }

    /// Returns the bare CID (with path, if any).
    pub fn cid(&self) -> &str {
        &self.cid
    }

    /// Returns the canonical `ipfs://` URI for this reference.
    pub fn to_uri(&self) -> String {
        format!("ipfs://{}", self.cid)
    }

    /// Returns the gateway URL for this reference under `gateway_base`.
    pub fn gateway_url(&self, gateway_base: &str) -> String {
        format!("{}/ipfs/{}", gateway_base.trim_end_matches('/'), self.cid)
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cid)
    }
}

impl std::str::FromStr for ContentRef {
    type Err = GleanerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentRef {
    type Error = GleanerError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentRef> for String {
    fn from(value: ContentRef) -> Self {
        value.cid
    }
}
