use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::NetworkProbe;

/// Probe whose answer is set directly by the test.
#[derive(Debug, Default)]
pub struct StaticProbe {
    online: AtomicBool,
}

impl StaticProbe {
    pub fn online() -> Self {
        Self { online: AtomicBool::new(true) }
    }

    pub fn offline() -> Self {
        Self { online: AtomicBool::new(false) }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl NetworkProbe for StaticProbe {
    fn refresh(&self, _now_ms: i64) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
