//! SQLite-backed store for accounts, signals, categories, and labels.
//!
//! The database lives at `~/.vendorpulse/vendorpulse.db`. Accounts, signal
//! rows, and category assignments are written by the surrounding import
//! pipeline; this core reads them and reconciles derived label assignments.
//! Labels are recomputable at any time from signals, so the label tables can
//! always be rebuilt — but the DB itself is the working store, not a
//! disposable cache.

use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags};

pub mod types;
pub use types::*;

pub mod accounts;
pub mod labels;

/// SQLite connection wrapper for engagement state.
///
/// Intentionally NOT `Clone` or `Sync`. Callers that share a connection
/// across threads hold it behind a `std::sync::Mutex`; the sync engine itself
/// never needs more than one writer at a time.
pub struct PulseDb {
    conn: Connection,
}

impl PulseDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&Self) -> Result<T, String>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| format!("Failed to begin transaction: {e}"))?;
        match f(self) {
            Ok(val) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|e| format!("Failed to commit transaction: {e}"))?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at `~/.vendorpulse/vendorpulse.db` and
    /// apply the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Open the database in read-only mode. Used by reporting readers for
    /// safe concurrent reads while the sync pipeline owns writes.
    pub fn open_readonly_at(path: &std::path::Path) -> Result<Self, DbError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.vendorpulse/vendorpulse.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".vendorpulse").join("vendorpulse.db"))
    }
}

// =============================================================================
// Shared test utilities
// =============================================================================

#[cfg(test)]
pub mod test_utils {
    use super::PulseDb;

    /// Create a temporary database for testing.
    ///
    /// We leak the `TempDir` so the directory persists for the duration of
    /// the test. Test temp dirs are cleaned up by the OS. FK enforcement is
    /// disabled so unit tests can insert rows without satisfying every
    /// foreign key constraint.
    pub fn test_db() -> PulseDb {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("test.db");
        std::mem::forget(dir);
        let db = PulseDb::open_at(path).expect("Failed to open test database");
        db.conn_ref()
            .execute_batch("PRAGMA foreign_keys = OFF;")
            .expect("disable FK for tests");
        db
    }
}

// =============================================================================
// Tests
// =============================================================================
