//! Search provider clients for serpcache.
//!
//! This crate provides the HTTP plumbing and the Bing and Google
//! [`ProviderAdapter`](serpcache_core::ProviderAdapter) implementations used
//! by the CLI.

pub mod bing;
mod decode;
pub mod error;
pub mod fetch;
pub mod google;

pub use bing::{BingAdapter, BingConfig, BingOptions, SafeSearch};
pub use error::ProviderError;
pub use fetch::ApiClient;
pub use google::{GoogleAdapter, GoogleConfig, GoogleOptions, GoogleSafeSearch};
