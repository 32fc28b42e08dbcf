//! Error types for the engine.

use std::sync::Arc;
use storefront_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced to callers of the engine.
///
/// Read-path problems (missing definitions, unknown tenants) never appear
/// here; they degrade to an absent result. `Clone` lets every caller joined
/// on one in-flight sync receive the same outcome.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The atomic replace-sync failed and was rolled back.
    #[error("sync transaction failed: {0}")]
    Transaction(#[source] Arc<StoreError>),

    /// Reading the current customization failed.
    #[error("store error: {0}")]
    Store(#[source] Arc<StoreError>),

    /// A blocking store task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Background(String),
}

impl EngineError {
    pub(crate) fn transaction(e: StoreError) -> Self {
        EngineError::Transaction(Arc::new(e))
    }

    pub(crate) fn store(e: StoreError) -> Self {
        EngineError::Store(Arc::new(e))
    }

    /// Returns true if this error came from a rolled-back sync.
    pub fn is_transaction_failure(&self) -> bool {
        matches!(self, EngineError::Transaction(_))
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(e: tokio::task::JoinError) -> Self {
        EngineError::Background(e.to_string())
    }
}
