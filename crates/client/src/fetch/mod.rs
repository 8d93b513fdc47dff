//! HTTP plumbing shared by the provider adapters.
//!
//! Issues one GET per page and turns the response into a [`RawPage`]:
//!
//! - 401/403 → `AuthError`, 429 → `RateLimited`, any other non-2xx → `HttpError`
//! - Timeouts and connection failures → `Timeout` / `Network`
//! - A 2xx body that is not JSON → `Parse`
//!
//! Error bodies are logged but never returned.

use crate::ProviderError;
use bytes::Bytes;
use reqwest::header;
use serpcache_core::RawPage;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = "serpcache/0.1";

/// Thin reqwest wrapper configured once per adapter.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(ProviderError::from)?;
        Ok(Self { http })
    }

    /// GET `url` with extra headers and query pairs, decoding the JSON body.
    ///
    /// `extra_query` is appended after the parameters already in `url`; use it
    /// for credentials that must stay out of cache keys.
    pub async fn get_page(
        &self, url: &str, headers: &[(&str, &str)], extra_query: &[(&str, &str)],
    ) -> Result<RawPage, ProviderError> {
        let mut request = self.http.get(url).header(header::ACCEPT, "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if !extra_query.is_empty() {
            request = request.query(extra_query);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), "provider response status");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "provider returned HTTP error");
            return Err(match status.as_u16() {
                401 | 403 => ProviderError::AuthError,
                429 => ProviderError::RateLimited,
                code => ProviderError::HttpError { status: code },
            });
        }

        let body: Bytes = response.bytes().await?;
        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(RawPage::new(value))
    }
}
