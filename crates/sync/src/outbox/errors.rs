use thiserror::Error;

/// Errors surfaced by outbox stores.
///
/// Store mutations report `Ok(false)` when the only problem is "operation
/// does not exist"; an `Err` always means the store itself failed (I/O,
/// corrupt state, poisoned lock) and the mutation did not take effect.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding the persisted document failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A panicking writer left the store lock poisoned.
    #[error("outbox state lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
