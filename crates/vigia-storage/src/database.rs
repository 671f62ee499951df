// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use tracing::debug;
use vigia_core::VigiaError;

/// Map a tokio-rusqlite error into the crate-wide storage error.
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error) -> VigiaError {
    VigiaError::Storage {
        source: Box::new(err),
    }
}

/// Map a rusqlite error into the crate-wide storage error.
pub(crate) fn map_rs_err(err: rusqlite::Error) -> VigiaError {
    VigiaError::Storage {
        source: Box::new(err),
    }
}

/// Handle to the single-writer SQLite database.
///
/// Wraps one `tokio_rusqlite::Connection`; all query modules accept
/// `&Database` and go through [`Database::connection`], so every write is
/// serialized on one background thread and SQLITE_BUSY cannot occur.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL mode enabled and
    /// run all pending migrations.
    pub async fn open(path: &str) -> Result<Self, VigiaError> {
        Self::open_with(path, true).await
    }

    /// Open (or create) the database at `path`, optionally without WAL.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, VigiaError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| VigiaError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_rs_err)?;

        let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
        let pragmas = format!(
            "PRAGMA journal_mode={journal_mode};\n\
             PRAGMA synchronous=NORMAL;\n\
             PRAGMA foreign_keys=ON;\n\
             PRAGMA busy_timeout=5000;"
        );
        conn.call(move |conn| {
            conn.execute_batch(&pragmas)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        // Migrations run on the writer thread; refinery tracks applied
        // versions in its own history table.
        let migration_result: Result<(), VigiaError> = conn
            .call(|conn| Ok(crate::migrations::run_migrations(conn)))
            .await
            .map_err(map_tr_err)?;
        migration_result?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying connection handle for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), VigiaError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
