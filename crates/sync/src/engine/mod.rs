//! Scheduling loop: workers pull ready operations from the shared outbox,
//! gate on connectivity, dispatch through the transport, and record
//! outcomes. The engine fans ticks out to its workers and optionally drives
//! itself from a background thread.

mod core;
mod errors;
mod probe;
mod worker;

pub use self::core::{EngineConfig, SyncEngine};
pub use self::errors::{EngineError, EngineResult};
pub use self::probe::{CallbackProbe, NetworkProbe, ProbeConfig};
pub use self::worker::{SendResult, SyncTransport, SyncWorker, WorkerConfig};
