use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use tracing::debug;

use super::errors::WalResult;
use super::record::WalRecord;

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WalWriterConfig {
    /// Log file location; parent directories are created on open.
    pub file_path: PathBuf,
    /// Call the platform sync after every append. Slower, safer.
    pub fsync_on_write: bool,
}

/// Append-only writer for the binary WAL.
///
/// Single-writer per file; concurrent writers on the same path are
/// undefined.
pub struct WalWriter {
    cfg: WalWriterConfig,
    file: File,
}

impl WalWriter {
    /// Open (or create) the log file in append mode.
    pub fn open(cfg: WalWriterConfig) -> WalResult<Self> {
        if let Some(parent) = cfg.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&cfg.file_path)?;
        Ok(Self { cfg, file })
    }

    /// Append one record and return the byte offset at which it begins.
    ///
    /// The record is written in full and flushed before returning; with
    /// `fsync_on_write` the data is also synced to stable storage.
    pub fn append(&mut self, record: &WalRecord) -> WalResult<u64> {
        let offset = self.file.seek(SeekFrom::End(0))?;

        self.file.write_all(&record.encode())?;
        self.file.flush()?;
        if self.cfg.fsync_on_write {
            self.file.sync_data()?;
        }

        debug!(offset, len = record.encoded_len(), "appended WAL record");
        Ok(offset)
    }
}
