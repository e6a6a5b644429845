//! Replay a WAL journal into an outbox store.
//!
//! The snapshot stores never write WAL records on their own; an embedder
//! that wants write-ahead durability journals intents through
//! [`Wal::append`](crate::wal::Wal::append) and rebuilds (or catches up) a
//! store from the log with [`restore_from_wal`].

use tracing::{debug, warn};

use crate::wal::{RecordType, Wal, WalError, WalRecord};

use super::errors::{StoreError, StoreResult};
use super::store::OutboxStore;

/// Apply one WAL record to a store.
///
/// `MarkDone`/`MarkFailed` records for ids the store does not know are
/// skipped: a pruned operation's tail records must not resurrect it.
pub fn apply_record(store: &dyn OutboxStore, record: &WalRecord) -> StoreResult<()> {
    match record.record_type {
        RecordType::PutOperation => match record.decode_operation() {
            Ok(op) => store.put(&op)?,
            Err(e) => {
                // A record that framed correctly but carries an undecodable
                // payload is dropped, consistent with replay tolerance.
                warn!(id = %record.id, error = %e, "skipping undecodable PutOperation record");
            }
        },
        RecordType::MarkDone => {
            if !store.mark_done(&record.id, record.ts_ms)? {
                debug!(id = %record.id, "skipping MarkDone for unknown operation");
            }
        }
        RecordType::MarkFailed => {
            if !store.mark_failed(
                &record.id,
                &record.error,
                record.ts_ms,
                record.next_retry_at_ms,
            )? {
                debug!(id = %record.id, "skipping MarkFailed for unknown operation");
            }
        }
    }
    Ok(())
}

/// Replay every record from `from_offset` into `store`.
///
/// Returns the number of records applied. Store errors abort the replay;
/// malformed log tails end it cleanly (see
/// [`WalReader`](crate::wal::WalReader)).
pub fn restore_from_wal(
    store: &dyn OutboxStore,
    wal: &Wal,
    from_offset: u64,
) -> StoreResult<usize> {
    let mut applied = 0;
    let mut deferred: StoreResult<()> = Ok(());

    let replayed = wal.replay(from_offset, |record| {
        if deferred.is_err() {
            return;
        }
        match apply_record(store, record) {
            Ok(()) => applied += 1,
            Err(e) => deferred = Err(e),
        }
    });

    if let Err(e) = replayed {
        return Err(match e {
            WalError::Io(e) => StoreError::Io(e),
            WalError::Serialization(e) => StoreError::Serialization(e),
            WalError::UnknownRecordType(t) => {
                StoreError::Io(std::io::Error::other(format!("unknown WAL record type {t}")))
            }
        });
    }
    deferred?;

    debug!(applied, "restored operations from WAL");
    Ok(applied)
}

#[cfg(test)]
mod tests {
    //! Unit tests for outbox::recovery.
    use super::*;
    use crate::outbox::memory::MemoryOutboxStore;
    use crate::outbox::types::{Operation, OperationStatus};
    use crate::wal::WalConfig;

    /// Validates `restore_from_wal` behavior for the journal replay
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms put/fail/done records reconstruct the final state.
    /// - Confirms records for unknown ids are skipped without error.
    #[test]
    fn test_restore_journal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let wal =
            Wal::new(WalConfig { file_path: dir.path().join("wal.log"), fsync_on_write: false });

        let op_a = Operation::new("http.post", "/a", "{}").with_id("op_a");
        let op_b = Operation::new("http.post", "/b", "{}").with_id("op_b");

        wal.append(&WalRecord::put_operation(&op_a, 1).unwrap()).unwrap();
        wal.append(&WalRecord::put_operation(&op_b, 2).unwrap()).unwrap();
        wal.append(&WalRecord::mark_failed("op_a", "timeout", 3, 500)).unwrap();
        wal.append(&WalRecord::mark_done("op_b", 4)).unwrap();
        wal.append(&WalRecord::mark_done("op_pruned", 5)).unwrap();

        let store = MemoryOutboxStore::new();
        let applied = restore_from_wal(&store, &wal, 0).unwrap();
        assert_eq!(applied, 5);

        let a = store.get("op_a").unwrap().unwrap();
        assert_eq!(a.status, OperationStatus::Failed);
        assert_eq!(a.last_error, "timeout");
        assert_eq!(a.next_retry_at_ms, 500);

        let b = store.get("op_b").unwrap().unwrap();
        assert_eq!(b.status, OperationStatus::Done);

        assert!(store.get("op_pruned").unwrap().is_none());
    }
}
