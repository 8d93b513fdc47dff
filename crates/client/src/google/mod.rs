//! Google Custom Search adapter.
//!
//! ### Specification
//!
//! - **Endpoint**: `https://www.googleapis.com/customsearch/v1`
//! - **Authentication**: `key` and `cx` query parameters, appended at request
//!   time so they never reach the cache key.
//! - **Paging**: at most 10 results per call, `start` is 1-based.
//! - **Exhaustion**: any page with fewer than 10 items is the last one (the
//!   adapter trait's default completeness rule).
//! - **Sanity check**: a payload is well-formed when it carries a string `kind`.

pub mod request;
pub mod response;

pub use request::{DEFAULT_GEOLOCATION, GoogleOptions, GoogleSafeSearch, MAX_RESULTS_PER_QUERY};
pub use response::GoogleApiResponse;

use crate::ProviderError;
use crate::fetch::{ApiClient, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use serpcache_core::config::{AppConfig, ConfigError};
use serpcache_core::{Error, PageIdentity, ProviderAdapter, RawPage, ResultEntry};
use std::time::Duration;

/// Default Custom Search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Google client configuration.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: String,
    /// Custom search engine id, sent as `cx`.
    pub cse_id: String,
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            cse_id: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl GoogleConfig {
    /// Build from the application configuration; key and engine id must be set.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let (api_key, cse_id) = config.require_google_credentials()?;
        Ok(Self {
            api_key: api_key.to_string(),
            cse_id: cse_id.to_string(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            ..Default::default()
        })
    }
}

/// [`ProviderAdapter`] for Google Custom Search.
#[derive(Debug, Clone)]
pub struct GoogleAdapter {
    client: ApiClient,
    config: GoogleConfig,
    options: GoogleOptions,
}

impl GoogleAdapter {
    pub fn new(config: GoogleConfig, options: GoogleOptions) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }
        if config.cse_id.is_empty() {
            return Err(ProviderError::MissingCseId);
        }
        options.validate()?;

        let client = ApiClient::new(config.timeout, &config.user_agent)?;
        Ok(Self { client, config, options })
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn name(&self) -> &str {
        "google"
    }

    fn page_size(&self) -> usize {
        MAX_RESULTS_PER_QUERY
    }

    fn page_identity(&self, query: &str, offset: usize) -> Result<PageIdentity, Error> {
        let uri = self.options.canonical_uri(&self.config.base_url, query, offset)?;
        Ok(PageIdentity::new(query, offset, uri))
    }

    async fn fetch_page(&self, query: &str, offset: usize) -> Result<RawPage, Error> {
        let identity = self.page_identity(query, offset)?;
        tracing::debug!(offset, "querying Google");

        let credentials = [("key", self.config.api_key.as_str()), ("cx", self.config.cse_id.as_str())];
        let page = self.client.get_page(identity.as_str(), &[], &credentials).await?;
        Ok(page)
    }

    fn count_items(&self, page: &RawPage) -> usize {
        page.array_len("/items")
    }

    fn is_well_formed(&self, page: &RawPage) -> bool {
        page.has_string_field("kind")
    }

    fn estimated_total(&self, page: &RawPage) -> i64 {
        GoogleApiResponse::from_page(page).total_results()
    }

    fn entries(&self, page: &RawPage) -> Vec<ResultEntry> {
        GoogleApiResponse::from_page(page).into_entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serpcache_core::{CacheDb, PaginatingCacheAggregator, RetryPolicy};
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(base_url: &str) -> GoogleAdapter {
        let config = GoogleConfig {
            api_key: "g-key".into(),
            cse_id: "engine".into(),
            base_url: base_url.into(),
            ..Default::default()
        };
        GoogleAdapter::new(config, GoogleOptions::default()).unwrap()
    }

    fn page(items: usize, start: usize) -> serde_json::Value {
        let items: Vec<_> = (start..start + items)
            .map(|i| {
                json!({
                    "title": format!("Result {i}"),
                    "link": format!("https://example.com/{i}"),
                    "snippet": "plain",
                    "htmlSnippet": format!("<b>hit</b> {i}")
                })
            })
            .collect();
        json!({"kind": "customsearch#search", "searchInformation": {"totalResults": "23"}, "items": items})
    }

    #[test]
    fn test_new_requires_credentials() {
        let missing_key = GoogleConfig { cse_id: "cx".into(), ..Default::default() };
        assert!(matches!(
            GoogleAdapter::new(missing_key, GoogleOptions::default()),
            Err(ProviderError::MissingApiKey)
        ));

        let missing_cx = GoogleConfig { api_key: "k".into(), ..Default::default() };
        assert!(matches!(
            GoogleAdapter::new(missing_cx, GoogleOptions::default()),
            Err(ProviderError::MissingCseId)
        ));
    }

    #[test]
    fn test_from_app_config() {
        let app = AppConfig {
            google_api_key: Some("k".into()),
            google_cse_id: Some("cx".into()),
            user_agent: "ua/1".into(),
            ..Default::default()
        };
        let config = GoogleConfig::from_app_config(&app).unwrap();
        assert_eq!(config.cse_id, "cx");
        assert_eq!(config.user_agent, "ua/1");
    }

    #[test]
    fn test_identity_has_no_credentials() {
        let identity = adapter(DEFAULT_BASE_URL).page_identity("rust", 10).unwrap();
        assert!(identity.as_str().contains("start=11"));
        assert!(!identity.as_str().contains("g-key"));
        assert!(!identity.as_str().contains("engine"));
    }

    #[test]
    fn test_providers_never_share_keys() {
        let google = adapter(DEFAULT_BASE_URL).page_identity("rust", 0).unwrap();
        let bing_config = crate::BingConfig { api_key: "k".into(), ..Default::default() };
        let bing = crate::BingAdapter::new(bing_config, crate::BingOptions::default())
            .unwrap()
            .page_identity("rust", 0)
            .unwrap();
        assert_ne!(google, bing);
    }

    #[test]
    fn test_completeness() {
        let google = adapter(DEFAULT_BASE_URL);
        let full = RawPage::new(page(10, 0));
        assert!(!google.is_page_set_complete(std::slice::from_ref(&full), 25));
        assert!(google.is_page_set_complete(std::slice::from_ref(&full), 10));
        assert!(google.is_page_set_complete(&[full, RawPage::new(page(3, 10))], 25));
    }

    #[test]
    fn test_null_field_keeps_counts_consistent() {
        let google = adapter(DEFAULT_BASE_URL);
        let mut payload = page(10, 0);
        payload["items"][2]["htmlSnippet"] = serde_json::Value::Null;
        payload["items"][5]["link"] = serde_json::Value::Null;
        let raw = RawPage::new(payload);

        assert_eq!(google.count_items(&raw), 10);
        assert_eq!(google.entries(&raw).len(), 10);
        assert_eq!(google.estimated_total(&raw), 23);
        assert!(!google.is_page_set_complete(std::slice::from_ref(&raw), 20));
    }

    #[test]
    fn test_well_formed_needs_kind() {
        let google = adapter(DEFAULT_BASE_URL);
        assert!(google.is_well_formed(&RawPage::new(page(1, 0))));
        assert!(!google.is_well_formed(&RawPage::new(json!({"items": []}))));
    }

    #[tokio::test]
    async fn test_multi_page_query_then_cache_hit() {
        let server = MockServer::start().await;

        for (start, items, first) in [("1", 10, 0), ("11", 10, 10), ("21", 3, 20)] {
            Mock::given(method("GET"))
                .and(path("/customsearch/v1"))
                .and(query_param("q", "rust"))
                .and(query_param("start", start))
                .and(query_param("key", "g-key"))
                .and(query_param("cx", "engine"))
                .respond_with(ResponseTemplate::new(200).set_body_json(page(items, first)))
                .expect(1)
                .mount(&server)
                .await;
        }

        let base_url = format!("{}/customsearch/v1", server.uri());
        let cache = CacheDb::open_in_memory().await.unwrap();
        let aggregator = PaginatingCacheAggregator::new(Arc::new(adapter(&base_url)), cache.clone())
            .with_retry_policy(RetryPolicy::new(2, Duration::ZERO));

        let live = aggregator.query("rust", 50).await.unwrap();
        assert_eq!(live.entries.len(), 23);
        assert_eq!(live.estimated_total_matches, 23);
        assert_eq!(live.called_identities.len(), 3);
        assert_eq!(live.entries[0].snippet, "\u{e000}hit\u{e001} 0");
        assert_eq!(cache.size().await.unwrap(), 3);

        let cached = aggregator.query("rust", 50).await.unwrap();
        assert!(cached.from_cache);
        assert_eq!(cached.entries, live.entries);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "quota"})))
            .expect(2)
            .mount(&server)
            .await;

        let cache = CacheDb::open_in_memory().await.unwrap();
        let aggregator = PaginatingCacheAggregator::new(Arc::new(adapter(&server.uri())), cache.clone())
            .with_retry_policy(RetryPolicy::new(2, Duration::ZERO));

        let response = aggregator.query("rust", 5).await.unwrap();
        assert_eq!(response.attempts, 2);
        assert!(response.entries.is_empty());
        assert_eq!(cache.size().await.unwrap(), 0);
    }
}
