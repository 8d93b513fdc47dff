//! Provider-agnostic query, page and response types.

use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Private-use character providers use to open a highlighted span.
pub const SNIPPET_BOLD_START: char = '\u{e000}';

/// Private-use character providers use to close a highlighted span.
pub const SNIPPET_BOLD_END: char = '\u{e001}';

/// Identity of one provider call: query, offset and provider parameters,
/// rendered as the canonical URI that keys the cache.
///
/// Two identities are equal iff their canonical URIs are byte-identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageIdentity {
    query: String,
    offset: usize,
    uri: String,
}

impl PageIdentity {
    pub fn new(query: impl Into<String>, offset: usize, uri: impl Into<String>) -> Self {
        Self { query: query.into(), offset, uri: uri.into() }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The canonical URI; this is the cache key.
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl PartialEq for PageIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for PageIdentity {}

impl Hash for PageIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

impl fmt::Display for PageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// One provider response, kept as the JSON the provider sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPage(serde_json::Value);

impl RawPage {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Parse a payload read back from the cache or the network.
    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text)
            .map(Self)
            .map_err(|e| Error::Decode(e.to_string()))
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Serialisation stored (compressed) in the cache.
    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }

    /// Array at a JSON pointer, if present.
    pub fn array_at(&self, pointer: &str) -> Option<&Vec<serde_json::Value>> {
        self.0.pointer(pointer).and_then(serde_json::Value::as_array)
    }

    /// Length of the array at a JSON pointer, 0 when absent.
    pub fn array_len(&self, pointer: &str) -> usize {
        self.array_at(pointer).map_or(0, Vec::len)
    }

    /// Whether the payload is an object carrying a string field `name`.
    pub fn has_string_field(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(serde_json::Value::is_string)
    }
}

/// One search hit, independent of the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub title: String,
    pub display_url: String,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_crawled: Option<DateTime<Utc>>,
}

/// Merged result of every page fetched or read for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResponse {
    /// Provider-reported total, taken from the first page.
    pub estimated_total_matches: i64,
    /// Entries in page order, truncated to the requested count.
    pub entries: Vec<ResultEntry>,
    pub called_identities: Vec<PageIdentity>,
    /// Aligned 1:1 with `called_identities`.
    pub raw_pages: Vec<RawPage>,
    /// True when every page came from the cache.
    #[serde(default)]
    pub from_cache: bool,
    /// Live fetch attempts made; 0 for a cache hit.
    #[serde(default)]
    pub attempts: u32,
}

impl AggregatedResponse {
    /// Merge per-page entries in order, stopping at `needed_results`.
    pub fn assemble(
        estimated_total_matches: i64, called_identities: Vec<PageIdentity>, raw_pages: Vec<RawPage>,
        page_entries: impl IntoIterator<Item = Vec<ResultEntry>>, needed_results: usize,
    ) -> Self {
        let entries = page_entries.into_iter().flatten().take(needed_results).collect();
        Self { estimated_total_matches, entries, called_identities, raw_pages, from_cache: false, attempts: 0 }
    }
}
