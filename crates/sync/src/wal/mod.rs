//! Append-only binary log of durable intents, replayable by byte offset.
//!
//! Three record types flow through the log: a full serialized operation
//! (`PutOperation`), a completion marker (`MarkDone`), and a failure marker
//! with error and next retry time (`MarkFailed`). The durability contract: a
//! record appended before a crash is either fully readable on replay or
//! treated as absent — the reader drops a partial tail rather than erroring.
//!
//! The snapshot-based stores in [`crate::outbox`] do not write WAL records
//! implicitly; [`crate::outbox::recovery`] provides the explicit bridge for
//! embedders that journal intents here.

mod errors;
mod reader;
mod record;
mod writer;

use std::path::PathBuf;

pub use self::errors::{WalError, WalResult};
pub use self::reader::WalReader;
pub use self::record::{RecordType, WalRecord};
pub use self::writer::{WalWriter, WalWriterConfig};

/// Facade configuration.
#[derive(Debug, Clone)]
pub struct WalConfig {
    /// Log file location.
    pub file_path: PathBuf,
    /// Sync to stable storage after every append.
    pub fsync_on_write: bool,
}

/// Convenience facade over [`WalWriter`] and [`WalReader`].
///
/// `append` opens a fresh writer per call — simple but costly. Hold a
/// [`WalWriter`] directly for sustained append throughput.
pub struct Wal {
    cfg: WalConfig,
}

impl Wal {
    /// Create a facade for the given log file.
    pub fn new(cfg: WalConfig) -> Self {
        Self { cfg }
    }

    /// Append one record, returning the byte offset at which it begins.
    pub fn append(&self, record: &WalRecord) -> WalResult<u64> {
        let mut writer = WalWriter::open(WalWriterConfig {
            file_path: self.cfg.file_path.clone(),
            fsync_on_write: self.cfg.fsync_on_write,
        })?;
        writer.append(record)
    }

    /// Replay every decodable record from `from_offset`, invoking
    /// `on_record` for each.
    ///
    /// Returns the offset of the last record yielded, or `None` when the log
    /// is missing or empty past `from_offset`.
    pub fn replay(
        &self,
        from_offset: u64,
        mut on_record: impl FnMut(&WalRecord),
    ) -> WalResult<Option<u64>> {
        let mut reader = match WalReader::open(&self.cfg.file_path) {
            Ok(reader) => reader,
            Err(WalError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        reader.seek(from_offset)?;

        let mut last = None;
        while let Some(record) = reader.next_record()? {
            on_record(&record);
            last = Some(reader.current_offset());
        }
        Ok(last)
    }
}
