pub mod sqlite;

pub use sqlite::{open_database, open_memory_database};

/// Errors from the local store layer.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration v{version} failed: {reason}")]
    MigrationFailed { version: i64, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
