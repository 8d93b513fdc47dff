//! SQLite-backed store of compressed provider pages.
//!
//! One logical table maps a canonical request URI to the gzip-compressed JSON
//! payload the provider returned for it. Access goes through tokio-rusqlite, so
//! every operation runs on the connection's background thread and writes from
//! any number of handle clones are serialised there.
//!
//! - Lazily opened write transaction, ended by an explicit `commit`
//! - Schema creation and version check on open
//! - Bypass open for repairing damaged files
//! - Bulk merge and a legacy JSON interchange format

pub mod blobs;
pub mod compress;
pub mod connection;
pub mod merge;
pub mod schema;

pub use crate::Error;

pub use blobs::{DEFAULT_KEY_BATCH, KeyCursor};
pub use compress::{compress, decompress};
pub use connection::CacheDb;
pub use merge::{LegacyEntries, load_legacy, save_legacy};
