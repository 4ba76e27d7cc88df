// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Within one process the namespace and the channel share one
//! [`Database`] handle; other processes open their own.

use std::path::Path;
use std::time::Duration;

use bayline_core::BaylineError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Convert a tokio-rusqlite error into [`BaylineError::Storage`].
pub(crate) fn map_tr_err<E>(e: tokio_rusqlite::Error<E>) -> BaylineError
where
    E: std::error::Error + Send + Sync + 'static,
{
    BaylineError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the migrated SQLite database.
///
/// Cheap to clone; clones share the same background connection.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, BaylineError> {
        Self::open_with(path, true).await
    }

    /// Open the database at `path`, choosing the journal mode.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, BaylineError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| BaylineError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| BaylineError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database. Nothing survives the handle.
    pub async fn open_in_memory() -> Result<Self, BaylineError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| BaylineError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), BaylineError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.busy_timeout(Duration::from_secs(5))?;
                if wal_mode {
                    conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
                }
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| -> Result<(), refinery::Error> {
                migrations::run_migrations(conn)
            })
            .await
            .map_err(map_tr_err)
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `PRAGMA integrity_check`. A healthy database yields `["ok"]`.
    pub async fn integrity_check(&self) -> Result<Vec<String>, BaylineError> {
        self.conn
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare("PRAGMA integrity_check")?;
                let rows = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Flush the WAL into the main database file.
    pub async fn close(&self) -> Result<(), BaylineError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
