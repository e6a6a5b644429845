use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::errors::WalResult;
use super::record::{RecordType, WalRecord, HEADER_LEN, MAGIC, VERSION};

/// Forward-only reader for the binary WAL.
///
/// Replay is truncated-tail tolerant: a short read, a magic/version mismatch,
/// or an unknown type byte all terminate the stream cleanly at the current
/// offset instead of failing. A partially written final record is therefore
/// simply absent.
pub struct WalReader {
    reader: BufReader<File>,
    offset: u64,
}

impl WalReader {
    /// Open the log file for reading.
    pub fn open(file_path: impl AsRef<Path>) -> WalResult<Self> {
        let reader = BufReader::new(File::open(file_path.as_ref())?);
        Ok(Self { reader, offset: 0 })
    }

    /// Position the cursor at an absolute byte offset.
    pub fn seek(&mut self, offset: u64) -> WalResult<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.offset = offset;
        Ok(())
    }

    /// Offset of the most recently yielded record.
    pub fn current_offset(&self) -> u64 {
        self.offset
    }

    /// Yield the next record, or `None` at end-of-stream.
    pub fn next_record(&mut self) -> WalResult<Option<WalRecord>> {
        let start = self.reader.stream_position()?;

        let mut header = [0u8; HEADER_LEN];
        if !self.read_full(&mut header)? {
            return Ok(None);
        }

        let magic = le_u32(&header, 0);
        let version = u16::from_le_bytes([header[4], header[5]]);
        if magic != MAGIC || version != VERSION {
            return Ok(None);
        }

        let Ok(record_type) = RecordType::try_from(header[6]) else {
            return Ok(None);
        };

        let ts_ms = le_i64(&header, 8);
        let id_len = le_u32(&header, 16) as usize;
        let payload_len = le_u32(&header, 20) as usize;
        let error_len = le_u32(&header, 24) as usize;
        let next_retry_at_ms = le_i64(&header, 28);

        let mut id = vec![0u8; id_len];
        if !self.read_full(&mut id)? {
            return Ok(None);
        }
        let mut payload = vec![0u8; payload_len];
        if !self.read_full(&mut payload)? {
            return Ok(None);
        }
        let mut error = vec![0u8; error_len];
        if !self.read_full(&mut error)? {
            return Ok(None);
        }

        self.offset = start;
        Ok(Some(WalRecord {
            record_type,
            ts_ms,
            id: String::from_utf8_lossy(&id).into_owned(),
            payload,
            error: String::from_utf8_lossy(&error).into_owned(),
            next_retry_at_ms,
        }))
    }

    /// Fill `buf` completely; `Ok(false)` signals end-of-stream mid-fill.
    fn read_full(&mut self, buf: &mut [u8]) -> WalResult<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => return Ok(false),
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }
}

fn le_u32(header: &[u8; HEADER_LEN], at: usize) -> u32 {
    u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]])
}

fn le_i64(header: &[u8; HEADER_LEN], at: usize) -> i64 {
    i64::from_le_bytes([
        header[at],
        header[at + 1],
        header[at + 2],
        header[at + 3],
        header[at + 4],
        header[at + 5],
        header[at + 6],
        header[at + 7],
    ])
}
