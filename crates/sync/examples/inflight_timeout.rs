//! Crash-recovery walkthrough: claim an operation without completing it
//! (simulating a worker that died mid-send), then let the sweep requeue and
//! redeliver it.
//!
//! Run with: `cargo run --example inflight_timeout -p driftbox-sync`

use std::sync::Arc;

use driftbox_sync::testing::FakeTransport;
use driftbox_sync::{
    EngineConfig, MemoryOutboxStore, Operation, Outbox, OutboxConfig, OutboxStore, SyncEngine,
};

fn main() {
    let outbox = Arc::new(Outbox::new(OutboxConfig::default(), Arc::new(MemoryOutboxStore::new())));
    let transport = Arc::new(FakeTransport::new());
    let engine = SyncEngine::new(
        EngineConfig { inflight_timeout_ms: 50, ..Default::default() },
        Arc::clone(&outbox),
        None,
        Some(transport as Arc<dyn driftbox_sync::SyncTransport>),
    )
    .expect("valid config");

    let id = outbox
        .enqueue(Operation::new("http.post", "/api/messages", r#"{"text":"hi"}"#), 0)
        .expect("enqueue");

    // A worker claims the op and then "crashes": nothing completes or fails
    // it, so it sits InFlight.
    assert!(outbox.claim(&id, 0).expect("claim"));
    println!("claimed and abandoned: {}", outbox.store().get(&id).unwrap().unwrap().status);

    // Past the timeout the sweep requeues it, and the same tick redelivers.
    engine.tick(60).expect("tick");
    println!("after sweep tick:      {}", outbox.store().get(&id).unwrap().unwrap().status);

    engine.tick(61).expect("tick");
    let op = outbox.store().get(&id).unwrap().unwrap();
    println!("after retry tick:      {} (attempt {})", op.status, op.attempt);
}
