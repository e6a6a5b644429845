use super::errors::StoreResult;
use super::types::{ListOptions, Operation};

/// Persistent map of operation id → operation, enforcing the status state
/// machine.
///
/// All mutations are atomic with respect to concurrent calls on the same
/// store, and every successful mutation is durable before it returns.
/// Implementations serialize mutations internally (a single mutex is
/// acceptable); state transitions on a single operation are therefore
/// linearizable.
///
/// [`claim`](Self::claim) is the mutual-exclusion primitive: it is the only
/// transition into `InFlight`, it atomically checks its precondition, and it
/// records the claiming owner. That is what guarantees at most one worker
/// owns an operation at a time — the idempotency key is a second line of
/// defense, not the first.
pub trait OutboxStore: Send + Sync {
    /// Insert or overwrite an operation by id.
    fn put(&self, op: &Operation) -> StoreResult<()>;

    /// Fetch an operation by id.
    fn get(&self, id: &str) -> StoreResult<Option<Operation>>;

    /// List candidate operations for sending.
    ///
    /// `Done` and `PermanentFailed` are never returned. `InFlight` is
    /// excluded unless `include_inflight`; not-yet-ready operations are
    /// excluded when `only_ready`. Ordering within the result is
    /// unspecified.
    fn list(&self, opts: &ListOptions) -> StoreResult<Vec<Operation>>;

    /// Claim an operation for sending: status → `InFlight`, owner recorded,
    /// `updated_at_ms` stamped.
    ///
    /// Returns `Ok(false)` when the operation is missing, already
    /// `InFlight`, or `Done` — a losing racer must skip, not resend.
    fn claim(&self, id: &str, owner: &str, now_ms: i64) -> StoreResult<bool>;

    /// Status → `Done`; clears `last_error` and the owner entry. Terminal.
    fn mark_done(&self, id: &str, now_ms: i64) -> StoreResult<bool>;

    /// Status → `Failed` with a diagnostic and the next retry time; clears
    /// the owner entry.
    fn mark_failed(
        &self,
        id: &str,
        error: &str,
        now_ms: i64,
        next_retry_at_ms: i64,
    ) -> StoreResult<bool>;

    /// Status → `PermanentFailed`; clears the owner entry. Terminal.
    fn mark_permanent_failed(&self, id: &str, error: &str, now_ms: i64) -> StoreResult<bool>;

    /// Delete `Done` operations with `updated_at_ms <= older_than_ms`,
    /// returning how many were removed.
    fn prune_done(&self, older_than_ms: i64) -> StoreResult<usize>;

    /// Crash recovery sweep: every `InFlight` operation whose
    /// `now_ms - updated_at_ms >= timeout_ms` goes back to `Failed` with
    /// `attempt += 1`, `next_retry_at_ms = now_ms`, a distinguished error
    /// string, and its owner entry cleared. Returns the requeue count.
    fn requeue_inflight_older_than(&self, now_ms: i64, timeout_ms: i64) -> StoreResult<usize>;
}

/// Error string recorded when the sweep requeues a stuck operation.
pub const INFLIGHT_REQUEUE_ERROR: &str = "requeued after inflight timeout";
