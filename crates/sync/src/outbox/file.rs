use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::errors::{StoreError, StoreResult};
use super::state::OutboxState;
use super::store::OutboxStore;
use super::types::{ListOptions, Operation};

/// Persisted document format version.
const OUTBOX_FORMAT_VERSION: u32 = 1;

/// On-disk document: `{ "version": 1, "ops": {...}, "owners": {...} }`.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedOutbox {
    version: u32,
    ops: HashMap<String, Operation>,
    owners: HashMap<String, String>,
}

/// Configuration for [`FileOutboxStore`].
#[derive(Debug, Clone)]
pub struct FileOutboxStoreConfig {
    /// Snapshot file location; parent directories are created on first
    /// flush.
    pub file_path: PathBuf,
    /// Indent the JSON document (handy when inspecting the file by hand).
    pub pretty_json: bool,
    /// Sync the snapshot to stable storage on every flush.
    pub fsync_on_write: bool,
}

impl FileOutboxStoreConfig {
    /// Compact, no-fsync configuration for the given path.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self { file_path: file_path.into(), pretty_json: false, fsync_on_write: false }
    }
}

struct FileState {
    loaded: bool,
    state: OutboxState,
}

/// File-backed reference store: the full working set in memory, persisted as
/// a single JSON document rewritten on every mutation.
///
/// Not a high-throughput store, but a simple and correct one. Each mutation
/// is applied to a candidate copy of the state that is committed to memory
/// only after the snapshot hits disk, so a failed flush cannot leave memory
/// and disk diverged. The snapshot itself is written to a temp file and
/// renamed into place.
pub struct FileOutboxStore {
    cfg: FileOutboxStoreConfig,
    inner: Mutex<FileState>,
}

impl FileOutboxStore {
    pub fn new(cfg: FileOutboxStoreConfig) -> Self {
        Self { cfg, inner: Mutex::new(FileState { loaded: false, state: OutboxState::default() }) }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, FileState>> {
        self.inner.lock().map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    /// Lazy load on first touch. A missing file is an empty store; a corrupt
    /// one is an error (and will be retried on the next call).
    fn load_if_needed(&self, guard: &mut FileState) -> StoreResult<()> {
        if guard.loaded {
            return Ok(());
        }

        match fs::read(&self.cfg.file_path) {
            Ok(bytes) => {
                let doc: PersistedOutbox = serde_json::from_slice(&bytes)?;
                if doc.version != OUTBOX_FORMAT_VERSION {
                    warn!(
                        found = doc.version,
                        expected = OUTBOX_FORMAT_VERSION,
                        "outbox snapshot version mismatch"
                    );
                }
                guard.state = OutboxState { ops: doc.ops, owners: doc.owners };
                debug!(ops = guard.state.ops.len(), "loaded outbox snapshot");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        guard.loaded = true;
        Ok(())
    }

    /// Write the full document: temp file, optional fsync, atomic rename.
    fn flush(&self, state: &OutboxState) -> StoreResult<()> {
        if let Some(parent) = self.cfg.file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let doc = PersistedOutbox {
            version: OUTBOX_FORMAT_VERSION,
            ops: state.ops.clone(),
            owners: state.owners.clone(),
        };
        let bytes = if self.cfg.pretty_json {
            serde_json::to_vec_pretty(&doc)?
        } else {
            serde_json::to_vec(&doc)?
        };

        let tmp_path = self.cfg.file_path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        if self.cfg.fsync_on_write {
            file.sync_all()?;
        }
        drop(file);
        fs::rename(&tmp_path, &self.cfg.file_path)?;

        Ok(())
    }

    /// Read path: load, then run `f` against the current state.
    fn with_state<T>(&self, f: impl FnOnce(&OutboxState) -> T) -> StoreResult<T> {
        let mut guard = self.lock()?;
        self.load_if_needed(&mut guard)?;
        Ok(f(&guard.state))
    }

    /// Mutation path: apply `f` to a candidate copy, flush when it reports a
    /// change, and only then commit the candidate to memory.
    fn mutate<T>(&self, f: impl FnOnce(&mut OutboxState) -> (T, bool)) -> StoreResult<T> {
        let mut guard = self.lock()?;
        self.load_if_needed(&mut guard)?;

        let mut candidate = guard.state.clone();
        let (out, changed) = f(&mut candidate);
        if changed {
            self.flush(&candidate)?;
            guard.state = candidate;
        }
        Ok(out)
    }
}

impl OutboxStore for FileOutboxStore {
    fn put(&self, op: &Operation) -> StoreResult<()> {
        self.mutate(|state| {
            state.put(op);
            ((), true)
        })
    }

    fn get(&self, id: &str) -> StoreResult<Option<Operation>> {
        self.with_state(|state| state.get(id))
    }

    fn list(&self, opts: &ListOptions) -> StoreResult<Vec<Operation>> {
        self.with_state(|state| state.list(opts))
    }

    fn claim(&self, id: &str, owner: &str, now_ms: i64) -> StoreResult<bool> {
        self.mutate(|state| {
            let claimed = state.claim(id, owner, now_ms);
            (claimed, claimed)
        })
    }

    fn mark_done(&self, id: &str, now_ms: i64) -> StoreResult<bool> {
        self.mutate(|state| {
            let marked = state.mark_done(id, now_ms);
            (marked, marked)
        })
    }

    fn mark_failed(
        &self,
        id: &str,
        error: &str,
        now_ms: i64,
        next_retry_at_ms: i64,
    ) -> StoreResult<bool> {
        self.mutate(|state| {
            let marked = state.mark_failed(id, error, now_ms, next_retry_at_ms);
            (marked, marked)
        })
    }

    fn mark_permanent_failed(&self, id: &str, error: &str, now_ms: i64) -> StoreResult<bool> {
        self.mutate(|state| {
            let marked = state.mark_permanent_failed(id, error, now_ms);
            (marked, marked)
        })
    }

    fn prune_done(&self, older_than_ms: i64) -> StoreResult<usize> {
        self.mutate(|state| {
            let removed = state.prune_done(older_than_ms);
            (removed, removed > 0)
        })
    }

    fn requeue_inflight_older_than(&self, now_ms: i64, timeout_ms: i64) -> StoreResult<usize> {
        self.mutate(|state| {
            let requeued = state.requeue_inflight_older_than(now_ms, timeout_ms);
            (requeued, requeued > 0)
        })
    }
}
