//! Error types for the persistence layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Settings column could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A previous holder of the connection panicked.
    #[error("store connection lock poisoned")]
    LockPoisoned,

    /// A row held a value that does not map onto the data model.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<uuid::Error> for StoreError {
    fn from(e: uuid::Error) -> Self {
        StoreError::InvalidData(format!("invalid id: {e}"))
    }
}
