use std::collections::HashMap;

use super::store::INFLIGHT_REQUEUE_ERROR;
use super::types::{ListOptions, Operation, OperationStatus};

/// In-memory working set shared by the store implementations: the operation
/// map plus the owner side table (populated only while an operation is
/// `InFlight`).
///
/// Methods here are the single implementation of the status state machine;
/// stores wrap them with locking and persistence. Every method that can
/// change state returns whether it did, so a persistent store knows when a
/// flush is due.
#[derive(Debug, Clone, Default)]
pub(crate) struct OutboxState {
    pub ops: HashMap<String, Operation>,
    pub owners: HashMap<String, String>,
}

impl OutboxState {
    pub fn put(&mut self, op: &Operation) {
        self.ops.insert(op.id.clone(), op.clone());
    }

    pub fn get(&self, id: &str) -> Option<Operation> {
        self.ops.get(id).cloned()
    }

    pub fn list(&self, opts: &ListOptions) -> Vec<Operation> {
        let mut out = Vec::with_capacity(opts.limit.min(self.ops.len()));

        for op in self.ops.values() {
            if op.status.is_terminal() {
                continue;
            }
            if !opts.include_inflight && op.status == OperationStatus::InFlight {
                continue;
            }
            if opts.only_ready && op.next_retry_at_ms > opts.now_ms {
                continue;
            }

            out.push(op.clone());
            if out.len() >= opts.limit {
                break;
            }
        }
        out
    }

    pub fn claim(&mut self, id: &str, owner: &str, now_ms: i64) -> bool {
        let Some(op) = self.ops.get_mut(id) else {
            return false;
        };

        // Done is terminal; InFlight already belongs to someone.
        if matches!(op.status, OperationStatus::Done | OperationStatus::InFlight) {
            return false;
        }

        op.status = OperationStatus::InFlight;
        op.updated_at_ms = now_ms;
        self.owners.insert(id.to_string(), owner.to_string());
        true
    }

    pub fn mark_done(&mut self, id: &str, now_ms: i64) -> bool {
        let Some(op) = self.ops.get_mut(id) else {
            return false;
        };

        op.status = OperationStatus::Done;
        op.updated_at_ms = now_ms;
        op.last_error.clear();
        self.owners.remove(id);
        true
    }

    pub fn mark_failed(
        &mut self,
        id: &str,
        error: &str,
        now_ms: i64,
        next_retry_at_ms: i64,
    ) -> bool {
        let Some(op) = self.ops.get_mut(id) else {
            return false;
        };

        op.status = OperationStatus::Failed;
        op.last_error = error.to_string();
        op.updated_at_ms = now_ms;
        op.next_retry_at_ms = next_retry_at_ms;
        self.owners.remove(id);
        true
    }

    pub fn mark_permanent_failed(&mut self, id: &str, error: &str, now_ms: i64) -> bool {
        let Some(op) = self.ops.get_mut(id) else {
            return false;
        };

        op.status = OperationStatus::PermanentFailed;
        op.last_error = error.to_string();
        op.updated_at_ms = now_ms;
        op.next_retry_at_ms = now_ms;
        self.owners.remove(id);
        true
    }

    pub fn prune_done(&mut self, older_than_ms: i64) -> usize {
        let doomed: Vec<String> = self
            .ops
            .iter()
            .filter(|(_, op)| {
                op.status == OperationStatus::Done && op.updated_at_ms <= older_than_ms
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &doomed {
            self.ops.remove(id);
            self.owners.remove(id);
        }
        doomed.len()
    }

    pub fn requeue_inflight_older_than(&mut self, now_ms: i64, timeout_ms: i64) -> usize {
        let mut count = 0;

        for (id, op) in &mut self.ops {
            if op.status != OperationStatus::InFlight {
                continue;
            }
            if now_ms - op.updated_at_ms < timeout_ms {
                continue;
            }

            op.status = OperationStatus::Failed;
            op.attempt += 1;
            op.updated_at_ms = now_ms;
            op.next_retry_at_ms = now_ms;
            op.last_error = INFLIGHT_REQUEUE_ERROR.to_string();
            self.owners.remove(id);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the shared outbox state machine.
    use super::*;

    fn op(id: &str) -> Operation {
        Operation::new("http.post", "/t", "{}").with_id(id)
    }

    /// Validates `OutboxState::claim` behavior for the mutual exclusion
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures the first claim succeeds and records the owner.
    /// - Ensures a second claim fails while the op is in flight.
    #[test]
    fn test_claim_is_exclusive() {
        let mut state = OutboxState::default();
        state.put(&op("a"));

        assert!(state.claim("a", "w1", 10));
        assert_eq!(state.owners.get("a").map(String::as_str), Some("w1"));
        assert!(!state.claim("a", "w2", 11));
        assert_eq!(state.owners.get("a").map(String::as_str), Some("w1"));
    }

    /// Validates `OutboxState::claim` behavior for the retry-after-failure
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures a failed op can be claimed again.
    /// - Ensures a done op can never be claimed.
    #[test]
    fn test_claim_allows_failed_refuses_done() {
        let mut state = OutboxState::default();
        state.put(&op("a"));

        assert!(state.claim("a", "w1", 10));
        assert!(state.mark_failed("a", "boom", 20, 30));
        assert!(state.claim("a", "w2", 40));

        assert!(state.mark_done("a", 50));
        assert!(!state.claim("a", "w3", 60));
    }

    /// Validates `OutboxState::mark_done` behavior for the terminal cleanup
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms the error string and owner entry are cleared.
    #[test]
    fn test_mark_done_clears_error_and_owner() {
        let mut state = OutboxState::default();
        state.put(&op("a"));
        state.claim("a", "w1", 1);
        state.mark_failed("a", "transient", 2, 3);
        state.claim("a", "w1", 4);

        assert!(state.mark_done("a", 5));

        let done = state.get("a").unwrap();
        assert_eq!(done.status, OperationStatus::Done);
        assert!(done.last_error.is_empty());
        assert!(!state.owners.contains_key("a"));
    }

    /// Validates `OutboxState::list` behavior for the readiness filter
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures terminal and in-flight ops are excluded.
    /// - Ensures not-yet-ready ops are excluded when `only_ready`.
    #[test]
    fn test_list_filters() {
        let mut state = OutboxState::default();
        state.put(&op("ready"));
        state.put(&op("later").with_next_retry_at_ms(1_000));
        state.put(&op("flying"));
        state.claim("flying", "w", 0);
        state.put(&op("finished"));
        state.mark_done("finished", 0);
        state.put(&op("dead"));
        state.mark_permanent_failed("dead", "no", 0);

        let ready = state.list(&ListOptions { now_ms: 10, ..Default::default() });
        let ids: Vec<&str> = ready.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["ready"]);

        let with_inflight = state.list(&ListOptions {
            now_ms: 10,
            include_inflight: true,
            ..Default::default()
        });
        assert_eq!(with_inflight.len(), 2);

        let everything_pending = state.list(&ListOptions {
            now_ms: 10,
            only_ready: false,
            ..Default::default()
        });
        assert_eq!(everything_pending.len(), 2);
    }

    /// Validates `OutboxState::requeue_inflight_older_than` behavior for the
    /// sweep scenario.
    ///
    /// Assertions:
    /// - Confirms only ops past the timeout are requeued.
    /// - Confirms requeue bumps the attempt, resets readiness, and clears
    ///   ownership.
    #[test]
    fn test_sweep_requeues_only_stale_inflight() {
        let mut state = OutboxState::default();
        state.put(&op("stale"));
        state.put(&op("fresh"));
        state.claim("stale", "w1", 0);
        state.claim("fresh", "w2", 90);

        let requeued = state.requeue_inflight_older_than(100, 50);

        assert_eq!(requeued, 1);
        let stale = state.get("stale").unwrap();
        assert_eq!(stale.status, OperationStatus::Failed);
        assert_eq!(stale.attempt, 1);
        assert_eq!(stale.next_retry_at_ms, 100);
        assert_eq!(stale.last_error, INFLIGHT_REQUEUE_ERROR);
        assert!(!state.owners.contains_key("stale"));

        assert_eq!(state.get("fresh").unwrap().status, OperationStatus::InFlight);
        assert!(state.owners.contains_key("fresh"));
    }

    /// Validates `OutboxState::prune_done` behavior for the retention
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms only done ops at or past the cutoff are removed.
    #[test]
    fn test_prune_done_respects_cutoff() {
        let mut state = OutboxState::default();
        state.put(&op("old"));
        state.mark_done("old", 10);
        state.put(&op("recent"));
        state.mark_done("recent", 100);
        state.put(&op("live"));

        assert_eq!(state.prune_done(50), 1);
        assert!(state.get("old").is_none());
        assert!(state.get("recent").is_some());
        assert!(state.get("live").is_some());
    }
}
