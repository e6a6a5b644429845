use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::retry::RetryPolicy;

use super::errors::StoreResult;
use super::metrics::OutboxMetrics;
use super::store::OutboxStore;
use super::types::{ListOptions, Operation};

/// Configuration for the [`Outbox`] policy layer.
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Identity recorded as the claim owner for this engine instance.
    pub owner: String,
    /// Retry policy applied on retryable failures.
    pub retry: RetryPolicy,
    /// Assign a generated id at enqueue when the operation has none.
    pub auto_generate_ids: bool,
    /// Assign a generated idempotency key at enqueue when absent.
    pub auto_generate_idempotency_key: bool,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            owner: "driftbox-sync".to_string(),
            retry: RetryPolicy::default(),
            auto_generate_ids: true,
            auto_generate_idempotency_key: true,
        }
    }
}

/// Thin policy layer over an [`OutboxStore`]: id and idempotency-key
/// generation, attempt counting, and backoff scheduling via [`RetryPolicy`].
///
/// Cheap to share: workers hold it behind an `Arc` and drive it with
/// explicit `now_ms` timestamps.
pub struct Outbox {
    cfg: OutboxConfig,
    store: Arc<dyn OutboxStore>,
    metrics: Arc<OutboxMetrics>,
}

impl Outbox {
    pub fn new(cfg: OutboxConfig, store: Arc<dyn OutboxStore>) -> Self {
        Self { cfg, store, metrics: Arc::new(OutboxMetrics::new()) }
    }

    /// Persist a new operation and return its id.
    ///
    /// Fills in generated ids/keys (when configured and absent), stamps
    /// `created_at_ms`/`updated_at_ms`, and makes the operation immediately
    /// ready unless it already carries a `next_retry_at_ms`.
    pub fn enqueue(&self, mut op: Operation, now_ms: i64) -> StoreResult<String> {
        if self.cfg.auto_generate_ids && op.id.is_empty() {
            op.id = make_id();
        }
        if self.cfg.auto_generate_idempotency_key && op.idempotency_key.is_empty() {
            op.idempotency_key = make_idempotency_key();
        }

        if op.created_at_ms == 0 {
            op.created_at_ms = now_ms;
        }
        op.updated_at_ms = now_ms;
        if op.next_retry_at_ms == 0 {
            op.next_retry_at_ms = now_ms;
        }

        self.store.put(&op)?;
        self.metrics.record_enqueue();
        debug!(id = %op.id, kind = %op.kind, "operation enqueued");
        Ok(op.id)
    }

    /// Ready candidates for sending: `Pending`/`Failed` with
    /// `next_retry_at_ms <= now_ms`, never `InFlight` or terminal.
    pub fn peek_ready(&self, now_ms: i64, limit: usize) -> StoreResult<Vec<Operation>> {
        self.store.list(&ListOptions {
            limit,
            now_ms,
            only_ready: true,
            include_inflight: false,
        })
    }

    /// Claim an operation for this instance's owner identity.
    pub fn claim(&self, id: &str, now_ms: i64) -> StoreResult<bool> {
        self.store.claim(id, &self.cfg.owner, now_ms)
    }

    /// Record a successful send.
    pub fn complete(&self, id: &str, now_ms: i64) -> StoreResult<bool> {
        let marked = self.store.mark_done(id, now_ms)?;
        if marked {
            self.metrics.record_completion();
            debug!(id, "operation completed");
        }
        Ok(marked)
    }

    /// Record a failed send.
    ///
    /// Bumps the attempt count, then routes by severity: a non-retryable
    /// failure goes straight to `PermanentFailed`; a retryable failure past
    /// the policy's attempt cap is escalated to `PermanentFailed` as well
    /// (leaving it `Failed` would put it right back into `peek_ready`
    /// forever); otherwise the operation returns to `Failed` with a
    /// backoff-computed `next_retry_at_ms`.
    pub fn fail(&self, id: &str, error: &str, now_ms: i64, retryable: bool) -> StoreResult<bool> {
        let Some(current) = self.store.get(id)? else {
            return Ok(false);
        };

        let attempt = current.attempt + 1;

        // Persist the attempt bump up front; the mark_* transitions below
        // never touch the counter (only the sweep does its own increment).
        let mut bumped = current;
        bumped.attempt = attempt;
        self.store.put(&bumped)?;

        if !retryable {
            warn!(id, attempt, error, "operation failed permanently");
            let marked = self.store.mark_permanent_failed(id, error, now_ms)?;
            if marked {
                self.metrics.record_permanent_failure();
            }
            return Ok(marked);
        }

        if !self.cfg.retry.can_retry(attempt) {
            warn!(id, attempt, error, "operation abandoned: attempts exhausted");
            let exhausted = format!("{error} (attempts exhausted)");
            let marked = self.store.mark_permanent_failed(id, &exhausted, now_ms)?;
            if marked {
                self.metrics.record_permanent_failure();
            }
            return Ok(marked);
        }

        let delay_ms = self.cfg.retry.compute_delay_ms(attempt);
        let next_retry_at_ms = now_ms + delay_ms;
        debug!(id, attempt, delay_ms, error, "operation failed, retry scheduled");

        let marked = self.store.mark_failed(id, error, now_ms, next_retry_at_ms)?;
        if marked {
            self.metrics.record_failure();
        }
        Ok(marked)
    }

    /// Drop `Done` operations last touched at or before `older_than_ms`.
    pub fn prune_done(&self, older_than_ms: i64) -> StoreResult<usize> {
        let removed = self.store.prune_done(older_than_ms)?;
        if removed > 0 {
            self.metrics.record_prunes(removed as u64);
            debug!(removed, "pruned completed operations");
        }
        Ok(removed)
    }

    /// The underlying store (workers use it for the in-flight sweep).
    pub fn store(&self) -> Arc<dyn OutboxStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &OutboxConfig {
        &self.cfg
    }

    pub fn metrics(&self) -> Arc<OutboxMetrics> {
        Arc::clone(&self.metrics)
    }
}

fn make_id() -> String {
    format!("op_{}", Uuid::new_v4().simple())
}

fn make_idempotency_key() -> String {
    format!("idem_{}", Uuid::new_v4().simple())
}
