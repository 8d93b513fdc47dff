//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! for durability and concurrency (WAL mode), checking the schema, and the
//! lifecycle operations shared by every holder of the handle.

use super::schema;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

/// Pragmas applied on every normal open.
///
/// `synchronous=FULL` makes `commit` a durability barrier under WAL.
const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=FULL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread. Clones share that connection: hand a clone to every
/// aggregator that should read and write the same file. Closing through any
/// clone closes it for all of them.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas,
    /// and creates or checks the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening cache");
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    ///
    /// Creates a temporary in-memory SQLite database with the same
    /// pragma configuration as file-based databases.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open a possibly damaged database without touching its schema.
    ///
    /// No pragmas are applied and the schema is left alone. Use [`CacheDb::repair_report`]
    /// on the returned handle, `close` it, then reopen with [`CacheDb::open`].
    pub async fn open_bypass(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        tracing::warn!(path = %path.display(), "opening cache in bypass mode");
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Ok(Self { conn })
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| -> Result<(), Error> {
            conn.execute_batch(PRAGMAS)?;
            schema::ensure(conn)
        })
        .await
        .map_err(Error::from)?;

        Ok(Self { conn })
    }

    /// Fold the write-ahead log into the main file and run an integrity check.
    ///
    /// Returns the lines reported by `PRAGMA integrity_check`; a healthy file
    /// reports the single line `ok`.
    pub async fn repair_report(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                let mut stmt = conn.prepare("PRAGMA integrity_check")?;
                let lines = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(lines)
            })
            .await
            .map_err(Error::from)
    }

    /// Make every preceding `put` durable.
    ///
    /// Ends the write transaction opened by the first uncommitted `put`.
    /// Does nothing when no write is pending.
    pub async fn commit(&self) -> Result<(), Error> {
        self.conn
            .call(|conn| -> Result<(), Error> {
                if !conn.is_autocommit() {
                    conn.execute_batch("COMMIT")?;
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Discard every uncommitted `put`, from this handle or any clone.
    ///
    /// Does nothing when no write is pending.
    pub async fn rollback(&self) -> Result<(), Error> {
        self.conn
            .call(|conn| -> Result<(), Error> {
                if !conn.is_autocommit() {
                    tracing::warn!("rolling back pending cache writes");
                    conn.execute_batch("ROLLBACK")?;
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Close the shared connection.
    ///
    /// Uncommitted writes are rolled back. Any further operation through this
    /// handle or any of its clones fails with [`Error::CacheClosed`].
    pub async fn close(&self) -> Result<(), Error> {
        tracing::debug!("closing cache");
        self.conn.clone().close().await.map_err(Error::from)
    }
}
