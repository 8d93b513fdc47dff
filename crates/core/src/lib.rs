//! Core types and shared functionality for serpcache.
//!
//! This crate provides:
//! - Compressed page cache with SQLite backend
//! - Cache-first paginating aggregator and the provider adapter contract
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod search;

pub use cache::CacheDb;
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use search::{
    AggregatedResponse, PageIdentity, PaginatingCacheAggregator, ProviderAdapter, RawPage, ResultEntry, RetryPolicy,
};
