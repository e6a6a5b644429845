//! Offline-first durable outbox and sync engine.
//!
//! Write intents are persisted as [`Operation`]s before any network attempt,
//! delivered through a pluggable [`SyncTransport`], and recovered after
//! crashes by an in-flight sweep. The crate is split along its dependency
//! order:
//!
//! - **`retry`**: pure, deterministic retry policy (attempt count in, delay
//!   out)
//! - **`wal`**: append-only binary log of durable intents, replayable by byte
//!   offset
//! - **`outbox`**: the operation state machine, its store contract, and the
//!   file/memory store implementations
//! - **`engine`**: the worker/engine scheduling loop that marries outbox,
//!   reachability probe, and transport
//!
//! Time never flows from the system clock into the core: every entry point
//! takes `now_ms` explicitly, so the whole pipeline is testable with
//! simulated time. Only the self-driven engine loop reads a [`Clock`], and
//! that clock is injectable too.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod engine;
pub mod outbox;
pub mod retry;
pub mod testing;
pub mod time;
pub mod wal;

// Re-export the types most embedders touch.
pub use engine::{
    CallbackProbe, EngineConfig, EngineError, EngineResult, NetworkProbe, ProbeConfig, SendResult,
    SyncEngine, SyncTransport, SyncWorker, WorkerConfig,
};
pub use outbox::{
    FileOutboxStore, FileOutboxStoreConfig, ListOptions, MemoryOutboxStore, Operation,
    OperationStatus, Outbox, OutboxConfig, OutboxMetrics, OutboxMetricsSnapshot, OutboxStore,
    StoreError, StoreResult,
};
pub use retry::RetryPolicy;
pub use time::{Clock, MockClock, SystemClock};
pub use wal::{
    RecordType, Wal, WalConfig, WalError, WalReader, WalRecord, WalResult, WalWriter,
    WalWriterConfig,
};
