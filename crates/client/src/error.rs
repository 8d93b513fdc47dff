//! Provider client error types.

use std::sync::Arc;

/// Errors from the search provider clients.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No API key configured for the provider.
    #[error("missing API key")]
    MissingApiKey,

    /// No custom search engine id configured.
    #[error("missing custom search engine id")]
    MissingCseId,

    /// Invalid search query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Market code not in the form `en-US`.
    #[error("invalid market: {0} (must be in the form en-US)")]
    InvalidMarket(String),

    /// Geolocation code not in the form `us`.
    #[error("invalid geolocation: {0} (must be in the form us)")]
    InvalidGeolocation(String),

    /// Authentication failed (invalid API key).
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// Rate limited by the provider.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// Non-success HTTP response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response body is not JSON.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ProviderError::Timeout } else { ProviderError::Network(Arc::new(err)) }
    }
}

impl From<ProviderError> for serpcache_core::Error {
    fn from(err: ProviderError) -> Self {
        use serpcache_core::Error;

        match err {
            ProviderError::MissingApiKey
            | ProviderError::MissingCseId
            | ProviderError::InvalidQuery(_)
            | ProviderError::InvalidMarket(_)
            | ProviderError::InvalidGeolocation(_) => Error::InvalidArgument(err.to_string()),
            ProviderError::Parse(msg) => Error::Decode(msg),
            ProviderError::AuthError
            | ProviderError::RateLimited
            | ProviderError::HttpError { .. }
            | ProviderError::Timeout
            | ProviderError::Network(_) => Error::Transport(err.to_string()),
        }
    }
}
