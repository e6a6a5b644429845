use serde::{Deserialize, Serialize};

use super::constants::*;

/// Deterministic retry policy mapping an attempt count to retry-ability and
/// delay.
///
/// The policy is pure configuration: identical `(policy, attempt)` inputs
/// always yield identical delays, so a process recovering from a crash
/// recomputes the same `next_retry_at_ms` that would have been chosen before
/// the crash.
///
/// `jitter_ratio` is carried for callers that want to spread retries (see
/// [`apply_jitter`](super::apply_jitter)); the policy itself never applies
/// it, precisely to keep delay computation deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Hard cap on delivery attempts.
    pub max_attempts: u32,
    /// Base delay in milliseconds (attempt 0 backs off by exactly this).
    pub base_delay_ms: i64,
    /// Upper clamp on the computed delay.
    pub max_delay_ms: i64,
    /// Exponential growth factor: delay = base * factor^attempt.
    pub factor: f64,
    /// Informational jitter ratio; never applied by the core.
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            factor: DEFAULT_FACTOR,
            jitter_ratio: DEFAULT_JITTER_RATIO,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.base_delay_ms <= 0 {
            return Err("base_delay_ms must be greater than 0".to_string());
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(format!(
                "max_delay_ms ({}) cannot be less than base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            ));
        }
        if self.factor < 1.0 {
            return Err("factor must be at least 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err("jitter_ratio must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }

    /// Whether another attempt is allowed after `attempt` attempts so far.
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before the next attempt, in milliseconds.
    ///
    /// `attempt` counts completed attempts: 0 yields the base delay. The
    /// result is clamped to `[base_delay_ms, max_delay_ms]` and the exponent
    /// is capped to keep the computation overflow-safe.
    pub fn compute_delay_ms(&self, attempt: u32) -> i64 {
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        let delay = (self.base_delay_ms as f64) * self.factor.powi(exponent as i32);

        if !delay.is_finite() || delay >= self.max_delay_ms as f64 {
            return self.max_delay_ms;
        }

        (delay as i64).clamp(self.base_delay_ms, self.max_delay_ms)
    }
}

/// Apply +/- `jitter_ratio / 2` of random jitter to a computed delay.
///
/// Helper for callers that want to spread synchronized retries; nothing in
/// the core calls this. The result is never negative.
pub fn apply_jitter(delay_ms: i64, jitter_ratio: f64) -> i64 {
    use rand::Rng;

    if jitter_ratio <= 0.0 || delay_ms <= 0 {
        return delay_ms;
    }

    let span = (delay_ms as f64) * jitter_ratio.clamp(0.0, 1.0);
    let jitter = rand::thread_rng().gen_range(-span / 2.0..=span / 2.0);
    ((delay_ms as f64 + jitter).max(0.0)) as i64
}
