//! Google Custom Search response types and normalization.

use crate::decode::lenient;
use scraper::Html;
use serde::Deserialize;
use serpcache_core::search::{SNIPPET_BOLD_END, SNIPPET_BOLD_START};
use serpcache_core::{RawPage, ResultEntry};

/// The parts of a Custom Search payload this crate reads.
///
/// Fields are decoded leniently, so one odd value never blanks the page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleApiResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub search_information: Option<SearchInformation>,
    /// Kept raw; each hit is decoded on its own.
    #[serde(default, deserialize_with = "lenient")]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInformation {
    /// Google sends this as a decimal string; older payloads used a number.
    #[serde(default)]
    pub total_results: Option<serde_json::Value>,
}

/// One search hit.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient")]
    pub snippet: String,
    #[serde(default, deserialize_with = "lenient")]
    pub html_snippet: Option<String>,
}

impl GoogleApiResponse {
    /// Typed view of a raw page. A payload that isn't an object reads as empty.
    pub fn from_page(page: &RawPage) -> Self {
        if !page.as_json().is_object() {
            return Self::default();
        }
        serde_json::from_value(page.as_json().clone()).unwrap_or_default()
    }

    pub fn total_results(&self) -> i64 {
        match self.search_information.as_ref().and_then(|s| s.total_results.as_ref()) {
            Some(serde_json::Value::String(s)) => s.parse().unwrap_or(0),
            Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or(0),
            _ => 0,
        }
    }

    /// Hits in provider order. A hit that isn't an object is skipped with a warning.
    pub fn into_entries(self) -> Vec<ResultEntry> {
        self.items
            .into_iter()
            .enumerate()
            .filter_map(|(position, item)| match Item::deserialize(item) {
                Ok(item) => Some(ResultEntry::from(item)),
                Err(e) => {
                    tracing::warn!(position, error = %e, "skipping undecodable Google result");
                    None
                }
            })
            .collect()
    }
}

impl From<Item> for ResultEntry {
    fn from(item: Item) -> Self {
        let snippet = match item.html_snippet {
            Some(html) => snippet_from_html(&html),
            None => item.snippet,
        };
        ResultEntry { title: item.title, display_url: item.link, snippet, last_crawled: None }
    }
}

/// Turn `<b>` spans into highlight markers, drop the rest of the markup and
/// collapse whitespace.
pub fn snippet_from_html(html: &str) -> String {
    let marked = html
        .replace("<b>", &SNIPPET_BOLD_START.to_string())
        .replace("</b>", &SNIPPET_BOLD_END.to_string());
    let fragment = Html::parse_fragment(&marked);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
