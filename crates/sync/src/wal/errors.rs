use thiserror::Error;

/// Errors surfaced by the write-ahead log.
///
/// Malformed data on replay is deliberately *not* an error: the reader treats
/// a bad header or a truncated tail as end-of-log, per the durability
/// contract (a partially written record is absent, never fatal).
#[derive(Debug, Error)]
pub enum WalError {
    /// Underlying file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding an operation payload failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record carried a type byte this version does not know.
    #[error("unknown WAL record type: {0}")]
    UnknownRecordType(u8),
}

/// Result type for WAL operations.
pub type WalResult<T> = Result<T, WalError>;
