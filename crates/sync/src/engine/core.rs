use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::outbox::Outbox;
use crate::time::{Clock, SystemClock};

use super::errors::{EngineError, EngineResult};
use super::probe::NetworkProbe;
use super::worker::{SyncTransport, SyncWorker, WorkerConfig};

/// Engine configuration, fanned out to each worker. All durations in
/// milliseconds.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of workers sharing the outbox.
    pub worker_count: usize,
    /// Maximum operations each worker pulls per tick.
    pub batch_limit: usize,
    /// Background-loop sleep when a tick processed nothing.
    pub idle_sleep_ms: i64,
    /// Background-loop sleep when the probe reports offline.
    pub offline_sleep_ms: i64,
    /// Age at which a stuck `InFlight` operation is forcibly requeued.
    pub inflight_timeout_ms: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            batch_limit: 25,
            idle_sleep_ms: 250,
            offline_sleep_ms: 500,
            inflight_timeout_ms: 10_000,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".to_string());
        }
        if self.batch_limit == 0 {
            return Err("batch_limit must be greater than 0".to_string());
        }
        if self.inflight_timeout_ms <= 0 {
            return Err("inflight_timeout_ms must be greater than 0".to_string());
        }
        if self.idle_sleep_ms < 0 || self.offline_sleep_ms < 0 {
            return Err("sleep durations cannot be negative".to_string());
        }
        Ok(())
    }

    fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            batch_limit: self.batch_limit,
            idle_sleep_ms: self.idle_sleep_ms,
            offline_sleep_ms: self.offline_sleep_ms,
            inflight_timeout_ms: self.inflight_timeout_ms,
        }
    }
}

/// Coordinator for the sync loop: owns N workers sharing one outbox, probe,
/// and transport.
///
/// Two drive modes:
/// - **manual** — the caller invokes [`tick`](Self::tick) with its own
///   timestamps (single-threaded integration, simulated-time tests);
/// - **self-driven** — [`start`](Self::start) spawns one background thread
///   that ticks on the injected [`Clock`] and sleeps when idle or offline.
///
/// `start`/`stop` are idempotent; dropping a running engine stops it.
pub struct SyncEngine {
    cfg: EngineConfig,
    workers: Arc<Vec<SyncWorker>>,
    probe: Option<Arc<dyn NetworkProbe>>,
    clock: Arc<dyn Clock>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyncEngine {
    /// Build an engine with `cfg.worker_count` workers over the shared
    /// collaborators.
    pub fn new(
        cfg: EngineConfig,
        outbox: Arc<Outbox>,
        probe: Option<Arc<dyn NetworkProbe>>,
        transport: Option<Arc<dyn SyncTransport>>,
    ) -> EngineResult<Self> {
        cfg.validate().map_err(EngineError::InvalidConfig)?;

        let workers = (0..cfg.worker_count)
            .map(|_| {
                SyncWorker::new(
                    cfg.worker_config(),
                    Arc::clone(&outbox),
                    probe.clone(),
                    transport.clone(),
                )
            })
            .collect();

        Ok(Self {
            cfg,
            workers: Arc::new(workers),
            probe,
            clock: Arc::new(SystemClock),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        })
    }

    /// Replace the clock driving the self-driven loop (tests use
    /// [`MockClock`](crate::time::MockClock)).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Execute one engine iteration across all workers at `now_ms`.
    ///
    /// Returns the total number of operations attempted.
    pub fn tick(&self, now_ms: i64) -> EngineResult<usize> {
        tick_workers(&self.workers, now_ms)
    }

    /// Start the background loop. No effect when already running.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let workers = Arc::clone(&self.workers);
        let probe = self.probe.clone();
        let clock = Arc::clone(&self.clock);
        let running = Arc::clone(&self.running);
        let idle_sleep_ms = self.cfg.idle_sleep_ms;
        let offline_sleep_ms = self.cfg.offline_sleep_ms;

        info!(workers = self.cfg.worker_count, "sync engine starting");
        self.handle = Some(std::thread::spawn(move || {
            run_loop(&workers, probe.as_deref(), &*clock, &running, idle_sleep_ms, offline_sleep_ms);
        }));
    }

    /// Request shutdown and join the background loop. No effect when not
    /// running.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("sync engine loop panicked");
            }
        }
        info!("sync engine stopped");
    }

    /// Whether the background loop is running.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_workers(workers: &[SyncWorker], now_ms: i64) -> EngineResult<usize> {
    let mut total = 0;
    for worker in workers {
        total += worker.tick(now_ms)?;
    }
    Ok(total)
}

fn run_loop(
    workers: &[SyncWorker],
    probe: Option<&dyn NetworkProbe>,
    clock: &dyn Clock,
    running: &AtomicBool,
    idle_sleep_ms: i64,
    offline_sleep_ms: i64,
) {
    while running.load(Ordering::SeqCst) {
        let now_ms = clock.millis_since_epoch();

        let processed = match tick_workers(workers, now_ms) {
            Ok(n) => n,
            Err(e) => {
                // Store failures here are transient from the loop's point of
                // view (disk full, permissions); keep ticking.
                error!(error = %e, "engine tick failed");
                0
            }
        };

        if processed > 0 {
            std::thread::yield_now();
            continue;
        }

        let offline = probe.map(|p| !p.refresh(now_ms)).unwrap_or(false);
        let sleep_ms = if offline { offline_sleep_ms } else { idle_sleep_ms };
        debug!(offline, sleep_ms, "engine idle");
        if sleep_ms > 0 {
            std::thread::sleep(Duration::from_millis(sleep_ms as u64));
        } else {
            std::thread::yield_now();
        }
    }
}
