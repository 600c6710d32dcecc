//! Connection management, adapted from the teacher's `DatabaseManager`
//! (read/write routing over `rusqlite`) to a single `duckdb::Connection`.
//!
//! DuckDB's `Connection` is not safe to share across threads without
//! external synchronization, and §5 only asks for a single-process,
//! single-writer engine with no internal multi-threaded writers — so
//! there is no read-pool/write-connection split here, just one
//! connection behind a mutex. `with_reader`/`with_writer` both route
//! through it; the split is kept at the call site so the repository
//! code documents its own read/write intent the way the teacher's does.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use drspec_core::errors::StorageError;

use crate::schema;

pub struct DatabaseManager {
    conn: Mutex<duckdb::Connection>,
    path: Option<PathBuf>,
}

impl DatabaseManager {
    /// Open (creating if absent) a file-backed database and run migrations.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Db {
                    message: e.to_string(),
                })?;
            }
        }
        let conn = duckdb::Connection::open(path).map_err(dbe)?;
        schema::apply_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (tests, dry runs).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = duckdb::Connection::open_in_memory().map_err(dbe)?;
        schema::apply_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` with shared (read) access to the connection.
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&duckdb::Connection) -> Result<T, StorageError>,
    {
        let guard = self.conn.lock().map_err(|_| StorageError::DbBusy)?;
        f(&guard).map_err(|e| self.classify(e))
    }

    /// Run `f` with exclusive (write) access to the connection.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut duckdb::Connection) -> Result<T, StorageError>,
    {
        let mut guard = self.conn.lock().map_err(|_| StorageError::DbBusy)?;
        f(&mut guard).map_err(|e| self.classify(e))
    }

    /// A query against a schema that was never migrated (the underlying
    /// file predates `drspec`'s tables, or was truncated out from under an
    /// open connection) surfaces from DuckDB as a catalog lookup failure.
    /// Re-tag that case as `NotInitialized` instead of a generic `Db`
    /// error, so callers can distinguish "point me at a real store" from
    /// an ordinary query failure (§7 state errors).
    fn classify(&self, err: StorageError) -> StorageError {
        match err {
            StorageError::Db { message } if message.contains("Catalog Error") => {
                StorageError::NotInitialized {
                    path: self.display_path(),
                }
            }
            other => other,
        }
    }

    fn display_path(&self) -> String {
        self.path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string())
    }

    /// Forces pending writes to disk. No-op for in-memory databases.
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        if self.path.is_none() {
            return Ok(());
        }
        self.with_reader(|conn| conn.execute_batch("CHECKPOINT;").map_err(dbe))
    }
}

pub(crate) fn dbe(e: impl std::fmt::Display) -> StorageError {
    StorageError::Db {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_opens_and_migrates() {
        let db = DatabaseManager::open_in_memory().unwrap();
        assert!(db.path().is_none());
        db.with_reader(|conn| {
            conn.execute_batch("SELECT * FROM artifacts LIMIT 0;")
                .map_err(dbe)
        })
        .unwrap();
    }

    #[test]
    fn file_backed_open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("contracts.db");
        let db = DatabaseManager::open(&db_path).unwrap();
        assert!(db_path.parent().unwrap().exists());
        assert_eq!(db.path(), Some(db_path.as_path()));
    }

    #[test]
    fn a_query_against_a_dropped_schema_is_reported_as_not_initialized() {
        let db = DatabaseManager::open_in_memory().unwrap();
        db.with_writer(|conn| conn.execute_batch("DROP TABLE artifacts;").map_err(dbe))
            .unwrap();

        let err = db
            .with_reader(|conn| conn.execute_batch("SELECT * FROM artifacts LIMIT 0;").map_err(dbe))
            .unwrap_err();
        match err {
            StorageError::NotInitialized { path } => assert_eq!(path, ":memory:"),
            other => panic!("expected NotInitialized, got {other:?}"),
        }
    }
}
