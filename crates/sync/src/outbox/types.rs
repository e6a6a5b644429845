use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of an operation.
///
/// Persisted as its integer value (`Pending=0` … `PermanentFailed=4`), which
/// is the on-disk contract of the JSON snapshot store. `Done` and
/// `PermanentFailed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OperationStatus {
    Pending = 0,
    InFlight = 1,
    Done = 2,
    Failed = 3,
    PermanentFailed = 4,
}

impl Default for OperationStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl From<OperationStatus> for u8 {
    fn from(status: OperationStatus) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for OperationStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pending),
            1 => Ok(Self::InFlight),
            2 => Ok(Self::Done),
            3 => Ok(Self::Failed),
            4 => Ok(Self::PermanentFailed),
            other => Err(format!("invalid operation status: {other}")),
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InFlight => write!(f, "inflight"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
            Self::PermanentFailed => write!(f, "permanent_failed"),
        }
    }
}

impl FromStr for OperationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "inflight" => Ok(Self::InFlight),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            "permanent_failed" => Ok(Self::PermanentFailed),
            other => Err(format!("invalid OperationStatus: {other}")),
        }
    }
}

impl OperationStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::PermanentFailed)
    }
}

/// The unit of durable work flowing through the outbox.
///
/// `kind` and `target` are opaque to the core: the former is a free-form
/// category tag consumed by the transport, the latter a routing hint (URL,
/// peer id, …). All timestamps are epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Unique identifier; generated at enqueue when empty.
    #[serde(default)]
    pub id: String,
    /// Free-form category tag, e.g. "http.post".
    #[serde(default)]
    pub kind: String,
    /// Routing hint, opaque to the core.
    #[serde(default)]
    pub target: String,
    /// Opaque payload blob.
    #[serde(default)]
    pub payload: String,
    /// Stable across retries; generated at enqueue when empty.
    #[serde(default)]
    pub idempotency_key: String,
    #[serde(default)]
    pub created_at_ms: i64,
    #[serde(default)]
    pub updated_at_ms: i64,
    /// Number of delivery attempts made so far (0 before the first send).
    #[serde(default)]
    pub attempt: u32,
    /// Earliest time the operation is eligible for (re)send.
    #[serde(default)]
    pub next_retry_at_ms: i64,
    #[serde(default)]
    pub status: OperationStatus,
    /// Diagnostic from the most recent failure; cleared on completion.
    #[serde(default)]
    pub last_error: String,
}

impl Operation {
    /// Create a pending operation with the given kind, target, and payload.
    pub fn new(
        kind: impl Into<String>,
        target: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            target: target.into(),
            payload: payload.into(),
            ..Default::default()
        }
    }

    /// Set an explicit id instead of relying on enqueue-time generation.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set an explicit idempotency key.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = key.into();
        self
    }

    /// Schedule the first send attempt for a specific time.
    pub fn with_next_retry_at_ms(mut self, next_retry_at_ms: i64) -> Self {
        self.next_retry_at_ms = next_retry_at_ms;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }

    pub fn is_failed(&self) -> bool {
        self.status == OperationStatus::Failed
    }

    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }
}

/// Filtering options for [`OutboxStore::list`](super::OutboxStore::list).
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Maximum number of operations returned.
    pub limit: usize,
    /// Reference time for readiness checks.
    pub now_ms: i64,
    /// Only return operations with `next_retry_at_ms <= now_ms`.
    pub only_ready: bool,
    /// Include `InFlight` operations (usually false).
    pub include_inflight: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self { limit: 50, now_ms: 0, only_ready: true, include_inflight: false }
    }
}
