use std::sync::Arc;

use tracing::{debug, warn};

use crate::outbox::{Operation, Outbox};

use super::errors::EngineResult;
use super::probe::NetworkProbe;

/// Outcome of one transport send.
#[derive(Debug, Clone, Default)]
pub struct SendResult {
    /// The payload reached the remote endpoint.
    pub ok: bool,
    /// When `ok` is false: whether the failure is worth retrying.
    pub retryable: bool,
    /// Diagnostic recorded in the operation's `last_error`.
    pub error: String,
}

impl SendResult {
    /// Successful delivery.
    pub fn success() -> Self {
        Self { ok: true, retryable: true, error: String::new() }
    }

    /// Transient failure; the operation will be rescheduled.
    pub fn retryable_failure(error: impl Into<String>) -> Self {
        Self { ok: false, retryable: true, error: error.into() }
    }

    /// Permanent failure; the operation will not be retried.
    pub fn permanent_failure(error: impl Into<String>) -> Self {
        Self { ok: false, retryable: false, error: error.into() }
    }
}

/// The network side effect, performed by the embedder (HTTP, WebSocket,
/// P2P, …).
///
/// `send` is synchronous from the core's point of view and runs while the
/// operation is `InFlight`. A send that outlives the engine's in-flight
/// timeout races the sweep: the operation may already be requeued when the
/// call finally returns, so implementations must treat late successes as
/// potentially obsolete — the idempotency key makes server-side
/// deduplication tractable.
pub trait SyncTransport: Send + Sync {
    fn send(&self, op: &Operation) -> SendResult;
}

/// Per-worker configuration. All durations in milliseconds.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum operations pulled per tick.
    pub batch_limit: usize,
    /// Engine-loop sleep when a tick processed nothing.
    pub idle_sleep_ms: i64,
    /// Engine-loop sleep when the probe reports offline.
    pub offline_sleep_ms: i64,
    /// Age at which a stuck `InFlight` operation is forcibly requeued.
    pub inflight_timeout_ms: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_limit: 25,
            idle_sleep_ms: 250,
            offline_sleep_ms: 500,
            inflight_timeout_ms: 10_000,
        }
    }
}

/// Single-step sync worker: sweep, gate, pull a ready batch, send, record.
///
/// `tick` is non-blocking apart from the one transport call per operation.
/// Multiple workers may share the same outbox; `claim` arbitrates so that a
/// candidate observed by two workers is sent by exactly one.
pub struct SyncWorker {
    cfg: WorkerConfig,
    outbox: Arc<Outbox>,
    probe: Option<Arc<dyn NetworkProbe>>,
    transport: Option<Arc<dyn SyncTransport>>,
}

impl SyncWorker {
    pub fn new(
        cfg: WorkerConfig,
        outbox: Arc<Outbox>,
        probe: Option<Arc<dyn NetworkProbe>>,
        transport: Option<Arc<dyn SyncTransport>>,
    ) -> Self {
        Self { cfg, outbox, probe, transport }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.cfg
    }

    /// Process one batch attempt; returns the number of operations whose
    /// send was attempted.
    pub fn tick(&self, now_ms: i64) -> EngineResult<usize> {
        // Recover operations whose owner crashed or never released them.
        let requeued = self
            .outbox
            .store()
            .requeue_inflight_older_than(now_ms, self.cfg.inflight_timeout_ms)?;
        if requeued > 0 {
            self.outbox.metrics().record_requeues(requeued as u64);
            warn!(requeued, "requeued stuck in-flight operations");
        }

        if !self.is_online(now_ms) {
            debug!("offline, skipping send cycle");
            return Ok(0);
        }

        self.process_ready(now_ms)
    }

    fn is_online(&self, now_ms: i64) -> bool {
        match &self.probe {
            Some(probe) => probe.refresh(now_ms),
            None => true,
        }
    }

    fn process_ready(&self, now_ms: i64) -> EngineResult<usize> {
        let candidates = self.outbox.peek_ready(now_ms, self.cfg.batch_limit)?;
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut attempted = 0;

        for op in &candidates {
            // Claim before sending so two workers racing on the same
            // candidate cannot both dispatch it.
            if !self.outbox.claim(&op.id, now_ms)? {
                continue;
            }

            let result = match &self.transport {
                Some(transport) => transport.send(op),
                None => SendResult::retryable_failure("No transport configured"),
            };

            if result.ok {
                self.outbox.complete(&op.id, now_ms)?;
            } else {
                let error =
                    if result.error.is_empty() { "send failed" } else { result.error.as_str() };
                self.outbox.fail(&op.id, error, now_ms, result.retryable)?;
            }

            attempted += 1;
        }

        Ok(attempted)
    }
}
