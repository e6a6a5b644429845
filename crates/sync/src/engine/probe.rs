use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// Best-effort connectivity signal consulted once per worker tick.
///
/// Implementations may cache internally; the worker treats the return value
/// as the online/offline truth for the current tick.
pub trait NetworkProbe: Send + Sync {
    /// Refresh (or reuse) the connectivity state as of `now_ms`.
    fn refresh(&self, now_ms: i64) -> bool;
}

/// Configuration for [`CallbackProbe`].
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Minimum time between two invocations of the checker; refreshes inside
    /// the window reuse the cached answer.
    pub min_refresh_interval_ms: i64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { min_refresh_interval_ms: 2_000 }
    }
}

struct ProbeState {
    last_refresh_ms: i64,
    online: bool,
    primed: bool,
}

/// Probe wrapping a caller-supplied checker closure with refresh throttling.
///
/// The checker runs on the first refresh and whenever the configured
/// interval has elapsed (or time moved backwards); in between, the cached
/// answer is returned.
pub struct CallbackProbe {
    cfg: ProbeConfig,
    checker: Box<dyn Fn() -> bool + Send + Sync>,
    state: Mutex<ProbeState>,
}

impl CallbackProbe {
    pub fn new(cfg: ProbeConfig, checker: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self {
            cfg,
            checker: Box::new(checker),
            state: Mutex::new(ProbeState { last_refresh_ms: 0, online: false, primed: false }),
        }
    }
}

impl NetworkProbe for CallbackProbe {
    fn refresh(&self, now_ms: i64) -> bool {
        // The cached flag is self-healing state; a poisoned lock is safe to
        // enter.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let stale = !state.primed
            || now_ms < state.last_refresh_ms
            || now_ms - state.last_refresh_ms >= self.cfg.min_refresh_interval_ms;

        if stale {
            state.online = (self.checker)();
            state.last_refresh_ms = now_ms;
            state.primed = true;
            debug!(online = state.online, "network probe refreshed");
        }

        state.online
    }
}
