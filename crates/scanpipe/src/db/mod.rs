//! Catalog storage in SQLite.
//!
//! Volumes, pages and articles live in one database file. The repositories
//! below are free functions over a shared [`Database`]; [`SqliteCatalog`]
//! exposes them as a [`crate::catalog::Catalog`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::info;
use rusqlite::Connection;

pub mod article_repo;
pub mod catalog;
pub mod error;
pub mod migrations;
pub mod page_repo;
pub mod types;
pub mod volume_repo;

pub use catalog::SqliteCatalog;
pub use error::DatabaseError;

/// How long a statement waits on a lock held by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One catalog connection shared by every worker of a pass.
///
/// Each volume's writes are single-row statements, so workers take turns on
/// the connection mutex rather than holding it across a stage.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the catalog file, creating it and its directory on first use,
    /// and brings the schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| DatabaseError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let db = Self::prepare(conn)?;

        info!("Catalog database ready at {}", path.display());
        Ok(db)
    }

    /// A throwaway catalog for tests and dry runs.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, DatabaseError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` while holding the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// `~/.scanpipe/data/scanpipe.db`, used when the config names no database.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".scanpipe").join("data").join("scanpipe.db"))
}
