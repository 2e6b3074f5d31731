//! Store error types
//!
//! Defines all errors that can occur in the persistence layer.

use thiserror::Error;

/// Errors that can occur in the store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Requested record does not exist (or belongs to another family)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write conflicts with existing data (duplicate name, already decided, ...)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored or supplied data is not usable for the operation
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Underlying SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O operation failed (blob store, data directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization of a JSON column failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
