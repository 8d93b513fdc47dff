//! Store schema, versioned through `PRAGMA user_version`.
//!
//! There is one table. A fresh file is stamped with [`SCHEMA_VERSION`]; a file
//! stamped with a newer version was written by a newer build and is refused
//! rather than silently reinterpreted.

use crate::Error;
use tokio_rusqlite::rusqlite;

/// Version written to `user_version` by this build.
pub const SCHEMA_VERSION: i64 = 1;

const CREATE_QUERIES: &str = "CREATE TABLE IF NOT EXISTS queries (
    key TEXT PRIMARY KEY NOT NULL,
    value BLOB NOT NULL
)";

/// Create the table if needed and check the stored version.
///
/// Runs on the connection thread during [`CacheDb::open`](super::CacheDb::open).
pub(crate) fn ensure(conn: &rusqlite::Connection) -> Result<(), Error> {
    let found: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if found > SCHEMA_VERSION {
        return Err(Error::MigrationFailed(format!(
            "cache schema version {found} is newer than supported version {SCHEMA_VERSION}"
        )));
    }

    conn.execute_batch(CREATE_QUERIES)?;
    if found < SCHEMA_VERSION {
        tracing::debug!(from = found, to = SCHEMA_VERSION, "stamping cache schema version");
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}
