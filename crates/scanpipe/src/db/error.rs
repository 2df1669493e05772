//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::model::UnknownVariant;

/// Errors from catalog storage.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating directories or files.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// The catalog lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Record not found: {0}")]
    NotFound(String),

    /// A natural key is already taken.
    #[error("Conflicting record: {0}")]
    Conflict(String),

    /// A stored column holds a value the model cannot represent.
    #[error("Corrupt row: {0}")]
    Corrupt(#[from] UnknownVariant),
}
