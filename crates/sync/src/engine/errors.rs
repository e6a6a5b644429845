use thiserror::Error;

use crate::outbox::StoreError;

/// Errors surfaced by the sync engine and its workers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine configuration failed validation.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The underlying outbox store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
