//! Local persistence for action knowledge.
//!
//! The knowledge store is one `SQLite` file, shared by every run on the
//! machine:
//!
//! ```text
//! ~/.narrate/knowledge.sqlite
//!   action_handlers   # one row per learned or promoted action kind
//! ```
//!
//! The schema version lives in `PRAGMA user_version`. Writers take an
//! immediate transaction, so at most one run merges at a time and the
//! others wait on the busy timeout.

mod knowledge;

use std::{fs, path::PathBuf, time::Duration};

use rusqlite::Connection;

/// Current schema version.
const SCHEMA_VERSION: u32 = 1;

/// How long a writer waits for another run's merge to finish.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no handler stored for action kind {0}")]
    UnknownAction(String),

    #[error("unsupported knowledge store version {0} (expected {SCHEMA_VERSION})")]
    UnsupportedVersion(u32),

    #[error("corrupt knowledge store: {0}")]
    Corrupt(String),

    #[error("knowledge store lock poisoned")]
    Poisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// File-backed knowledge store.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Opens (creating if needed) the store at `path` and migrates its schema.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let storage = Self { path };
        let conn = storage.connect()?;
        migrate(&conn)?;
        Ok(storage)
    }

    /// Returns the default store path: `~/.narrate/knowledge.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".narrate").join("knowledge.sqlite"))
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

/// Brings the schema up to [`SCHEMA_VERSION`].
fn migrate(conn: &Connection) -> Result<()> {
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    match version {
        0 => {
            conn.execute_batch(
                "BEGIN;
                 CREATE TABLE IF NOT EXISTS action_handlers (
                     kind          TEXT PRIMARY KEY,
                     template      TEXT NOT NULL,
                     confidence    INTEGER NOT NULL,
                     usage_count   INTEGER NOT NULL DEFAULT 0,
                     learned       INTEGER NOT NULL,
                     needs_review  INTEGER NOT NULL,
                     first_seen    TEXT NOT NULL,
                     last_used     TEXT
                 );
                 PRAGMA user_version = 1;
                 COMMIT;",
            )?;
            Ok(())
        }
        SCHEMA_VERSION => Ok(()),
        other => Err(StorageError::UnsupportedVersion(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn open_creates_parent_and_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("knowledge.sqlite");
        Storage::open(&path).unwrap();
        assert!(path.exists());

        let conn = Connection::open(&path).unwrap();
        let version: u32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn reopen_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.sqlite");
        Storage::open(&path).unwrap();
        Storage::open(&path).unwrap();
    }

    #[test]
    fn newer_schema_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.sqlite");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 9;").unwrap();
        drop(conn);

        let err = Storage::open(&path).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedVersion(9)));
    }
}
