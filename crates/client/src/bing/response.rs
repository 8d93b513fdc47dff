//! Bing Web Search response types and normalization.

use crate::decode::lenient;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serpcache_core::search::{SNIPPET_BOLD_END, SNIPPET_BOLD_START};
use serpcache_core::{RawPage, ResultEntry};

/// The parts of a Bing payload this crate reads. Everything else is ignored.
///
/// Every field is decoded leniently, so one odd value never blanks the page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BingApiResponse {
    #[serde(rename = "_type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub web_pages: Option<WebPages>,
    #[serde(default, deserialize_with = "lenient")]
    pub ranking_response: Option<RankingResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPages {
    #[serde(default, deserialize_with = "lenient")]
    pub total_estimated_matches: i64,
    /// Kept raw; each result is decoded on its own.
    #[serde(default, deserialize_with = "lenient")]
    pub value: Vec<serde_json::Value>,
}

/// One web result.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPage {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub display_url: String,
    #[serde(default, deserialize_with = "lenient")]
    pub snippet: String,
    #[serde(default, deserialize_with = "lenient")]
    pub date_last_crawled: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankingResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub mainline: Option<Mainline>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Mainline {
    #[serde(default, deserialize_with = "lenient")]
    pub items: Vec<serde_json::Value>,
}

impl BingApiResponse {
    /// Typed view of a raw page. A payload that isn't an object reads as empty.
    pub fn from_page(page: &RawPage) -> Self {
        if !page.as_json().is_object() {
            return Self::default();
        }
        serde_json::from_value(page.as_json().clone()).unwrap_or_default()
    }

    /// Results on this page, decodable or not.
    pub fn web_page_count(&self) -> usize {
        self.web_pages.as_ref().map_or(0, |w| w.value.len())
    }

    /// Mainline ranking slots; 0 when absent.
    pub fn mainline_len(&self) -> usize {
        self.ranking_response
            .as_ref()
            .and_then(|r| r.mainline.as_ref())
            .map_or(0, |m| m.items.len())
    }

    pub fn total_estimated_matches(&self) -> i64 {
        self.web_pages.as_ref().map_or(0, |w| w.total_estimated_matches)
    }

    /// Results in provider order. A result that isn't an object is skipped with a warning.
    pub fn into_entries(self) -> Vec<ResultEntry> {
        let Some(web_pages) = self.web_pages else {
            return Vec::new();
        };
        web_pages
            .value
            .into_iter()
            .enumerate()
            .filter_map(|(position, item)| match WebPage::deserialize(item) {
                Ok(page) => Some(ResultEntry::from(page)),
                Err(e) => {
                    tracing::warn!(position, error = %e, "skipping undecodable Bing result");
                    None
                }
            })
            .collect()
    }
}

impl From<WebPage> for ResultEntry {
    fn from(page: WebPage) -> Self {
        ResultEntry {
            title: page.name,
            display_url: strip_highlights(&page.display_url),
            snippet: page.snippet,
            last_crawled: page.date_last_crawled.as_deref().and_then(parse_crawl_date),
        }
    }
}

/// Drop the highlight markers Bing wraps around matched terms.
pub fn strip_highlights(text: &str) -> String {
    text.chars().filter(|c| *c != SNIPPET_BOLD_START && *c != SNIPPET_BOLD_END).collect()
}

/// Bing reports crawl dates either with an offset or as naive UTC.
fn parse_crawl_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(e) => {
            tracing::debug!(date = raw, error = %e, "unparseable crawl date");
            None
        }
    }
}
