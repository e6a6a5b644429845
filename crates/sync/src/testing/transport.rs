use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::engine::{SendResult, SyncTransport};
use crate::outbox::Operation;

/// Outcome a [`FakeTransport`] should produce for matching operations.
#[derive(Debug, Clone)]
pub struct TransportRule {
    pub ok: bool,
    pub retryable: bool,
    pub error: String,
}

impl TransportRule {
    pub fn success() -> Self {
        Self { ok: true, retryable: true, error: String::new() }
    }

    pub fn retryable_failure(error: impl Into<String>) -> Self {
        Self { ok: false, retryable: true, error: error.into() }
    }

    pub fn permanent_failure(error: impl Into<String>) -> Self {
        Self { ok: false, retryable: false, error: error.into() }
    }

    fn to_result(&self) -> SendResult {
        SendResult {
            ok: self.ok,
            retryable: self.retryable,
            error: if self.ok { String::new() } else { self.error.clone() },
        }
    }
}

impl Default for TransportRule {
    fn default() -> Self {
        Self::success()
    }
}

struct Rules {
    default: TransportRule,
    by_kind: HashMap<String, TransportRule>,
    by_target: HashMap<String, TransportRule>,
}

/// Rule-based fake transport: outcomes are chosen per operation target,
/// then per kind, then by the default rule. Rules can be swapped mid-test
/// to model a recovering backend.
pub struct FakeTransport {
    rules: Mutex<Rules>,
    calls: AtomicUsize,
}

impl FakeTransport {
    /// A transport that succeeds for everything.
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Rules {
                default: TransportRule::success(),
                by_kind: HashMap::new(),
                by_target: HashMap::new(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the fallback rule.
    pub fn set_default(&self, rule: TransportRule) {
        self.lock_rules().default = rule;
    }

    /// Override the outcome for operations of a kind (e.g. "http.post").
    pub fn set_rule_for_kind(&self, kind: impl Into<String>, rule: TransportRule) {
        self.lock_rules().by_kind.insert(kind.into(), rule);
    }

    /// Override the outcome for a target (e.g. "/api/messages").
    pub fn set_rule_for_target(&self, target: impl Into<String>, rule: TransportRule) {
        self.lock_rules().by_target.insert(target.into(), rule);
    }

    /// Number of `send` invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock_rules(&self) -> std::sync::MutexGuard<'_, Rules> {
        // Test double: a poisoned lock just means a previous test assertion
        // panicked mid-call; the rules themselves are still usable.
        self.rules.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTransport for FakeTransport {
    fn send(&self, op: &Operation) -> SendResult {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let rules = self.lock_rules();
        if let Some(rule) = rules.by_target.get(&op.target) {
            return rule.to_result();
        }
        if let Some(rule) = rules.by_kind.get(&op.kind) {
            return rule.to_result();
        }
        rules.default.to_result()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::transport.
    use super::*;

    fn op(kind: &str, target: &str) -> Operation {
        Operation::new(kind, target, "{}").with_id("op_t")
    }

    /// Validates `FakeTransport::send` behavior for the rule precedence
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms target rules beat kind rules, which beat the default.
    /// - Confirms the call counter tracks every send.
    #[test]
    fn test_rule_precedence() {
        let transport = FakeTransport::new();
        transport.set_rule_for_kind("chat.send", TransportRule::retryable_failure("kind down"));
        transport.set_rule_for_target("/special", TransportRule::permanent_failure("gone"));

        assert!(transport.send(&op("http.post", "/api")).ok);

        let by_kind = transport.send(&op("chat.send", "/api"));
        assert!(!by_kind.ok && by_kind.retryable);
        assert_eq!(by_kind.error, "kind down");

        let by_target = transport.send(&op("chat.send", "/special"));
        assert!(!by_target.ok && !by_target.retryable);

        assert_eq!(transport.call_count(), 3);
    }

    /// Validates `FakeTransport::set_default` behavior for the mid-test
    /// swap scenario.
    ///
    /// Assertions:
    /// - Confirms a swapped default changes subsequent outcomes.
    #[test]
    fn test_default_swap() {
        let transport = FakeTransport::new();
        transport.set_default(TransportRule::retryable_failure("down"));
        assert!(!transport.send(&op("k", "/t")).ok);

        transport.set_default(TransportRule::success());
        assert!(transport.send(&op("k", "/t")).ok);
    }
}
