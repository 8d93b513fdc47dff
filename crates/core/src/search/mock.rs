//! Scripted in-memory provider for aggregator tests.

use super::model::{PageIdentity, RawPage, ResultEntry};
use super::provider::ProviderAdapter;
use crate::Error;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Serves `available` synthetic results in pages of `page_size`.
///
/// Every fetch pops one flag from `malformed`; a `true` flag drops the
/// `kind` discriminator from that payload. Offsets of every fetch are recorded.
pub struct ScriptedAdapter {
    pub page_size: usize,
    pub available: usize,
    pub total: i64,
    pub fail_at_offset: Option<usize>,
    malformed: Mutex<VecDeque<bool>>,
    fetches: Mutex<Vec<usize>>,
    identities: Mutex<Vec<usize>>,
}

impl ScriptedAdapter {
    pub fn new(page_size: usize, available: usize, total: i64) -> Self {
        Self {
            page_size,
            available,
            total,
            fail_at_offset: None,
            malformed: Mutex::new(VecDeque::new()),
            fetches: Mutex::new(Vec::new()),
            identities: Mutex::new(Vec::new()),
        }
    }

    pub fn with_malformed(self, script: &[bool]) -> Self {
        *self.malformed.lock().unwrap() = script.iter().copied().collect();
        self
    }

    pub fn failing_at(mut self, offset: usize) -> Self {
        self.fail_at_offset = Some(offset);
        self
    }

    /// Offsets of every fetch so far, in call order.
    pub fn fetched_offsets(&self) -> Vec<usize> {
        self.fetches.lock().unwrap().clone()
    }

    /// Offsets of every identity built so far, cache lookups included.
    pub fn identity_offsets(&self) -> Vec<usize> {
        self.identities.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    fn build_page(&self, query: &str, offset: usize, malformed: bool) -> RawPage {
        let end = (offset + self.page_size).min(self.available);
        let items: Vec<_> = (offset..end)
            .map(|i| json!({"title": format!("{query} #{i}"), "link": format!("r{i}.example"), "snippet": "s"}))
            .collect();
        let mut page = json!({"kind": "test#page", "items": items, "total": self.total});
        if malformed && let Some(fields) = page.as_object_mut() {
            fields.remove("kind");
        }
        RawPage::new(page)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn page_identity(&self, query: &str, offset: usize) -> Result<PageIdentity, Error> {
        if query.is_empty() {
            return Err(Error::InvalidArgument("query cannot be empty".into()));
        }
        self.identities.lock().unwrap().push(offset);
        Ok(PageIdentity::new(query, offset, format!("test://scripted?q={query}&n={}&offset={offset}", self.page_size)))
    }

    async fn fetch_page(&self, query: &str, offset: usize) -> Result<RawPage, Error> {
        self.fetches.lock().unwrap().push(offset);
        if self.fail_at_offset == Some(offset) {
            return Err(Error::Transport("HTTP 503".into()));
        }
        let malformed = self.malformed.lock().unwrap().pop_front().unwrap_or(false);
        Ok(self.build_page(query, offset, malformed))
    }

    fn count_items(&self, page: &RawPage) -> usize {
        page.array_len("/items")
    }

    fn is_well_formed(&self, page: &RawPage) -> bool {
        page.has_string_field("kind")
    }

    fn estimated_total(&self, page: &RawPage) -> i64 {
        page.as_json().get("total").and_then(serde_json::Value::as_i64).unwrap_or(0)
    }

    fn entries(&self, page: &RawPage) -> Vec<ResultEntry> {
        page.array_at("/items")
            .into_iter()
            .flatten()
            .map(|item| ResultEntry {
                title: item["title"].as_str().unwrap_or_default().to_string(),
                display_url: item["link"].as_str().unwrap_or_default().to_string(),
                snippet: item["snippet"].as_str().unwrap_or_default().to_string(),
                last_crawled: None,
            })
            .collect()
    }
}
