//! Integration tests for the outbox stores.
//!
//! Covers the state-machine properties end-to-end against the file-backed
//! store — idempotent terminals, claim/fail/claim cycles, concurrent claim
//! arbitration — and checks the persisted JSON document against the
//! documented contract.

use std::sync::Arc;

use driftbox_sync::{
    FileOutboxStore, FileOutboxStoreConfig, ListOptions, MemoryOutboxStore, Operation,
    OperationStatus, OutboxStore,
};

fn file_store(dir: &tempfile::TempDir) -> FileOutboxStore {
    FileOutboxStore::new(FileOutboxStoreConfig {
        file_path: dir.path().join("outbox.json"),
        pretty_json: true,
        fsync_on_write: true,
    })
}

fn op(id: &str) -> Operation {
    Operation::new("http.post", "/api/messages", r#"{"text":"hello"}"#).with_id(id)
}

/// Put-then-get round trip plus overwrite-by-id semantics.
///
/// # Test Steps
/// 1. Put an operation and read it back unchanged
/// 2. Put a modified operation under the same id
/// 3. Verify the overwrite, not a duplicate
#[test]
fn test_put_get_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(&dir);

    let original = op("op_1");
    store.put(&original).unwrap();
    assert_eq!(store.get("op_1").unwrap(), Some(original.clone()));

    let updated = Operation { attempt: 3, ..original };
    store.put(&updated).unwrap();
    assert_eq!(store.get("op_1").unwrap().unwrap().attempt, 3);
    assert_eq!(store.list(&ListOptions { now_ms: 1, ..Default::default() }).unwrap().len(), 1);
}

/// Terminal idempotence: `mark_done` twice keeps returning true and keeps
/// the status at `Done`.
#[test]
fn test_mark_done_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(&dir);
    store.put(&op("op_1")).unwrap();

    assert!(store.mark_done("op_1", 10).unwrap());
    assert!(store.mark_done("op_1", 20).unwrap());

    let done = store.get("op_1").unwrap().unwrap();
    assert_eq!(done.status, OperationStatus::Done);
    assert_eq!(done.updated_at_ms, 20);
}

/// The claim/fail/claim cycle: a failed operation becomes claimable again
/// once its retry time arrives.
///
/// # Test Steps
/// 1. Claim, then mark failed with a future retry time
/// 2. Verify the op is not listed as ready before that time but is after
/// 3. Claim again successfully
#[test]
fn test_claim_fail_claim_cycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(&dir);
    store.put(&op("op_1")).unwrap();

    assert!(store.claim("op_1", "worker-a", 0).unwrap());
    assert!(store.mark_failed("op_1", "503", 5, 1_000).unwrap());

    let not_ready = store.list(&ListOptions { now_ms: 999, ..Default::default() }).unwrap();
    assert!(not_ready.is_empty());

    let ready = store.list(&ListOptions { now_ms: 1_000, ..Default::default() }).unwrap();
    assert_eq!(ready.len(), 1);

    assert!(store.claim("op_1", "worker-b", 1_000).unwrap());
    assert_eq!(store.get("op_1").unwrap().unwrap().status, OperationStatus::InFlight);
}

/// Concurrent claims: many threads racing on one operation, exactly one
/// wins.
///
/// # Test Steps
/// 1. Put a single pending op
/// 2. Spawn 8 threads that all try to claim it
/// 3. Verify exactly one claim returned true
#[test]
fn test_concurrent_claim_single_winner() {
    let store = Arc::new(MemoryOutboxStore::new());
    store.put(&op("op_contended")).unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        handles.push(std::thread::spawn(move || {
            store.claim("op_contended", &format!("worker-{i}"), 0).unwrap()
        }));
    }

    let winners =
        handles.into_iter().map(|h| h.join().unwrap()).filter(|won| *won).count();

    assert_eq!(winners, 1);
    assert_eq!(store.get("op_contended").unwrap().unwrap().status, OperationStatus::InFlight);
}

/// The persisted snapshot honors the documented JSON contract: top-level
/// `version`/`ops`/`owners`, integer statuses, exact field names.
#[test]
fn test_snapshot_matches_contract() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(&dir);

    store.put(&op("op_1")).unwrap();
    store.claim("op_1", "worker-a", 7).unwrap();

    let raw = std::fs::read_to_string(dir.path().join("outbox.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(doc["version"], 1);
    let persisted = &doc["ops"]["op_1"];
    for field in [
        "id",
        "kind",
        "target",
        "payload",
        "idempotency_key",
        "created_at_ms",
        "updated_at_ms",
        "attempt",
        "next_retry_at_ms",
        "status",
        "last_error",
    ] {
        assert!(persisted.get(field).is_some(), "missing field {field}");
    }
    assert_eq!(persisted["status"], 1); // InFlight
    assert_eq!(doc["owners"]["op_1"], "worker-a");
}

/// A sweep after reopening the file store still recovers claims made by a
/// previous process (the owner table is durable).
///
/// # Test Steps
/// 1. Claim in one store instance, drop it (simulated crash)
/// 2. Reopen and sweep past the timeout
/// 3. Verify the op is `Failed`, ready now, with the distinguished error
#[test]
fn test_sweep_after_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let store = file_store(&dir);
        store.put(&op("op_1")).unwrap();
        assert!(store.claim("op_1", "dead-worker", 0).unwrap());
    }

    let store = file_store(&dir);
    assert_eq!(store.requeue_inflight_older_than(10_000, 5_000).unwrap(), 1);

    let swept = store.get("op_1").unwrap().unwrap();
    assert_eq!(swept.status, OperationStatus::Failed);
    assert_eq!(swept.attempt, 1);
    assert_eq!(swept.next_retry_at_ms, 10_000);
    assert_eq!(swept.last_error, "requeued after inflight timeout");
}
