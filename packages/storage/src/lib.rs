// ABOUTME: Data layer foundations for Porchlight
// ABOUTME: Storage error type, SQLite pool setup and embedded migrations

pub mod db;

use porchlight_core::ValidationError;
use thiserror::Error;

pub use db::{connect, connect_in_memory, run_migrations};

/// Storage errors shared by every domain storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Duplicate {0}")]
    Duplicate(String),
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Cannot move {entity} from '{from}' to '{to}'")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StorageError::NotFound(what.into())
    }

    /// Map a unique-constraint violation onto `Duplicate`, anything else onto `Sqlx`
    pub fn from_insert(err: sqlx::Error, what: impl Into<String>) -> Self {
        let is_unique = err
            .as_database_error()
            .map(|db_err| db_err.is_unique_violation())
            .unwrap_or(false);

        if is_unique {
            StorageError::Duplicate(what.into())
        } else {
            StorageError::Sqlx(err)
        }
    }
}
