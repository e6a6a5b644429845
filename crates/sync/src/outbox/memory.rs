use std::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use super::state::OutboxState;
use super::store::OutboxStore;
use super::types::{ListOptions, Operation};

/// Volatile store for tests and embedders that bring their own durability.
///
/// Same state machine as [`FileOutboxStore`](super::FileOutboxStore), no
/// I/O. Lock poisoning surfaces as [`StoreError::LockPoisoned`] rather than
/// a panic.
#[derive(Debug, Default)]
pub struct MemoryOutboxStore {
    state: RwLock<OutboxState>,
}

impl MemoryOutboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, OutboxState>> {
        self.state.read().map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, OutboxState>> {
        self.state.write().map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl OutboxStore for MemoryOutboxStore {
    fn put(&self, op: &Operation) -> StoreResult<()> {
        self.write()?.put(op);
        Ok(())
    }

    fn get(&self, id: &str) -> StoreResult<Option<Operation>> {
        Ok(self.read()?.get(id))
    }

    fn list(&self, opts: &ListOptions) -> StoreResult<Vec<Operation>> {
        Ok(self.read()?.list(opts))
    }

    fn claim(&self, id: &str, owner: &str, now_ms: i64) -> StoreResult<bool> {
        Ok(self.write()?.claim(id, owner, now_ms))
    }

    fn mark_done(&self, id: &str, now_ms: i64) -> StoreResult<bool> {
        Ok(self.write()?.mark_done(id, now_ms))
    }

    fn mark_failed(
        &self,
        id: &str,
        error: &str,
        now_ms: i64,
        next_retry_at_ms: i64,
    ) -> StoreResult<bool> {
        Ok(self.write()?.mark_failed(id, error, now_ms, next_retry_at_ms))
    }

    fn mark_permanent_failed(&self, id: &str, error: &str, now_ms: i64) -> StoreResult<bool> {
        Ok(self.write()?.mark_permanent_failed(id, error, now_ms))
    }

    fn prune_done(&self, older_than_ms: i64) -> StoreResult<usize> {
        Ok(self.write()?.prune_done(older_than_ms))
    }

    fn requeue_inflight_older_than(&self, now_ms: i64, timeout_ms: i64) -> StoreResult<usize> {
        Ok(self.write()?.requeue_inflight_older_than(now_ms, timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for outbox::memory.
    use super::*;
    use crate::outbox::types::OperationStatus;

    /// Validates `MemoryOutboxStore::put` behavior for the put-then-get
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `get` returns the stored operation unchanged.
    /// - Confirms `put` overwrites by id.
    #[test]
    fn test_put_then_get() {
        let store = MemoryOutboxStore::new();
        let op = Operation::new("http.post", "/api", "{}").with_id("op_1");

        store.put(&op).unwrap();
        assert_eq!(store.get("op_1").unwrap(), Some(op.clone()));

        let replacement = Operation { payload: "{\"v\":2}".to_string(), ..op };
        store.put(&replacement).unwrap();
        assert_eq!(store.get("op_1").unwrap().unwrap().payload, "{\"v\":2}");
    }

    /// Validates `MemoryOutboxStore::mark_done` behavior for the idempotent
    /// terminal scenario.
    ///
    /// Assertions:
    /// - Ensures `mark_done` returns true both times and the status stays
    ///   `Done`.
    #[test]
    fn test_mark_done_twice() {
        let store = MemoryOutboxStore::new();
        store.put(&Operation::new("k", "t", "p").with_id("op_1")).unwrap();

        assert!(store.mark_done("op_1", 10).unwrap());
        assert!(store.mark_done("op_1", 20).unwrap());
        assert_eq!(store.get("op_1").unwrap().unwrap().status, OperationStatus::Done);
    }

    /// Validates mutation return values for the missing operation scenario.
    ///
    /// Assertions:
    /// - Confirms every by-id mutation reports `Ok(false)` for unknown ids.
    #[test]
    fn test_missing_id_reports_false() {
        let store = MemoryOutboxStore::new();

        assert!(!store.claim("ghost", "w", 0).unwrap());
        assert!(!store.mark_done("ghost", 0).unwrap());
        assert!(!store.mark_failed("ghost", "e", 0, 0).unwrap());
        assert!(!store.mark_permanent_failed("ghost", "e", 0).unwrap());
    }
}
