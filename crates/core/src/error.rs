//! Unified error types for serpcache.
//!
//! Only malformed provider payloads are absorbed locally (by the aggregator's
//! retry loop). Every other variant surfaces to the caller as soon as it occurs.

use tokio_rusqlite::rusqlite;

/// Unified error types for the cache, the aggregator and provider adapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad argument or configuration, raised before any I/O.
    #[error("INVALID_ARGUMENT: {0}")]
    InvalidArgument(String),

    /// Network failure or non-success HTTP status from a provider.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// Provider payload failed the adapter's well-formedness check.
    #[error("MALFORMED_RESPONSE: {0}")]
    MalformedResponse(String),

    /// Provider payload could not be decoded as JSON.
    #[error("DECODE_ERROR: {0}")]
    Decode(String),

    /// The store was closed by one of its holders.
    #[error("CACHE_CLOSED")]
    CacheClosed,

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// The stored schema can't be created or isn't one this build understands.
    #[error("CACHE_ERROR: schema: {0}")]
    MigrationFailed(String),

    /// Compression, decompression or legacy file I/O failed.
    #[error("CACHE_IO: {0}")]
    CacheIo(String),
}

impl Error {
    /// Whether the error leaves the store unusable.
    pub fn is_cache_fatal(&self) -> bool {
        matches!(self, Error::CacheClosed | Error::Database(_) | Error::MigrationFailed(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::CacheClosed,
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::CacheClosed,
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        match err {
            tokio_rusqlite::Error::ConnectionClosed => Error::CacheClosed,
            other => Error::Database(other),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Transport("HTTP 503".to_string());
        assert!(err.to_string().contains("TRANSPORT_ERROR"));
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn test_connection_closed_maps_to_cache_closed() {
        let err: Error = tokio_rusqlite::Error::<rusqlite::Error>::ConnectionClosed.into();
        assert!(matches!(err, Error::CacheClosed));
        assert!(err.is_cache_fatal());
    }

    #[test]
    fn test_nested_error_unwraps() {
        let err: Error = tokio_rusqlite::Error::Error(Error::InvalidArgument("offset".into())).into();
        assert!(matches!(err, Error::InvalidArgument(msg) if msg == "offset"));
    }
}
