use crate::outbox::Operation;

use super::errors::{WalError, WalResult};

/// Magic prefix of every record header ("VIXW").
pub(crate) const MAGIC: u32 = 0x5649_5857;

/// On-disk format version.
pub(crate) const VERSION: u16 = 1;

/// Fixed header size in bytes.
pub(crate) const HEADER_LEN: usize = 36;

/// Kind of durable intent a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    /// Full serialized operation (the payload is the operation as JSON).
    PutOperation = 1,
    /// The operation identified by `id` completed.
    MarkDone = 2,
    /// The operation identified by `id` failed; carries the error string and
    /// the next retry time.
    MarkFailed = 3,
}

impl TryFrom<u8> for RecordType {
    type Error = WalError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::PutOperation),
            2 => Ok(Self::MarkDone),
            3 => Ok(Self::MarkFailed),
            other => Err(WalError::UnknownRecordType(other)),
        }
    }
}

/// One durable intent in the append-only log.
///
/// Serialized as a fixed 36-byte little-endian header (`magic`, `version`,
/// `type`, `reserved`, `ts_ms`, `id_len`, `payload_len`, `error_len`,
/// `next_retry_at_ms`) followed by the id, payload, and error bytes with no
/// padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    pub record_type: RecordType,
    pub ts_ms: i64,
    pub id: String,
    pub payload: Vec<u8>,
    pub error: String,
    pub next_retry_at_ms: i64,
}

impl WalRecord {
    /// Build a `PutOperation` record carrying `op` serialized as JSON.
    pub fn put_operation(op: &Operation, ts_ms: i64) -> WalResult<Self> {
        Ok(Self {
            record_type: RecordType::PutOperation,
            ts_ms,
            id: op.id.clone(),
            payload: serde_json::to_vec(op)?,
            error: String::new(),
            next_retry_at_ms: op.next_retry_at_ms,
        })
    }

    /// Build a `MarkDone` record for `id`.
    pub fn mark_done(id: impl Into<String>, ts_ms: i64) -> Self {
        Self {
            record_type: RecordType::MarkDone,
            ts_ms,
            id: id.into(),
            payload: Vec::new(),
            error: String::new(),
            next_retry_at_ms: 0,
        }
    }

    /// Build a `MarkFailed` record for `id`.
    pub fn mark_failed(
        id: impl Into<String>,
        error: impl Into<String>,
        ts_ms: i64,
        next_retry_at_ms: i64,
    ) -> Self {
        Self {
            record_type: RecordType::MarkFailed,
            ts_ms,
            id: id.into(),
            payload: Vec::new(),
            error: error.into(),
            next_retry_at_ms,
        }
    }

    /// Decode the payload of a `PutOperation` record back into an operation.
    pub fn decode_operation(&self) -> WalResult<Operation> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// Total encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.id.len() + self.payload.len() + self.error.len()
    }

    /// Encode the record as header + body.
    pub(crate) fn encode(&self) -> Vec<u8> {
        let id = self.id.as_bytes();
        let error = self.error.as_bytes();

        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&MAGIC.to_le_bytes());
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.push(self.record_type as u8);
        buf.push(0); // reserved
        buf.extend_from_slice(&self.ts_ms.to_le_bytes());
        buf.extend_from_slice(&(id.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(error.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.next_retry_at_ms.to_le_bytes());
        buf.extend_from_slice(id);
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(error);
        buf
    }
}
