//! Time abstraction for the self-driven engine loop.
//!
//! The core never reads the system clock: every entry point takes `now_ms`
//! explicitly. The one exception is the background loop spawned by
//! [`SyncEngine::start`](crate::engine::SyncEngine::start), which reads time
//! through this trait so that even the loop is testable with [`MockClock`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of epoch-milliseconds timestamps.
pub trait Clock: Send + Sync {
    /// Milliseconds since the UNIX epoch.
    fn millis_since_epoch(&self) -> i64;
}

/// Real wall-clock implementation for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn millis_since_epoch(&self) -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
    }
}

/// Mock clock for deterministic tests.
///
/// Clones share the same underlying time, so a test can hold one handle while
/// an engine loop reads another.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now_ms: Arc<AtomicI64>,
}

impl MockClock {
    /// Create a mock clock starting at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock clock starting at `now_ms`.
    pub fn starting_at(now_ms: i64) -> Self {
        Self { now_ms: Arc::new(AtomicI64::new(now_ms)) }
    }

    /// Advance the clock by `delta_ms` milliseconds.
    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Set the clock to an absolute time.
    pub fn set_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn millis_since_epoch(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
