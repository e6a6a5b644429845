//! Smoke walkthrough: enqueue an operation, drive one manual tick, and
//! inspect the result.
//!
//! Run with: `cargo run --example outbox_smoke -p driftbox-sync`

use std::sync::Arc;

use driftbox_sync::testing::FakeTransport;
use driftbox_sync::{
    Clock, EngineConfig, FileOutboxStore, FileOutboxStoreConfig, Operation, Outbox, OutboxConfig,
    OutboxStore, SyncEngine, SystemClock,
};

fn main() {
    let dir = std::env::temp_dir().join("driftbox-smoke");
    let store = Arc::new(FileOutboxStore::new(FileOutboxStoreConfig {
        file_path: dir.join("outbox.json"),
        pretty_json: true,
        fsync_on_write: false,
    }));
    let outbox = Arc::new(Outbox::new(OutboxConfig::default(), store));

    let transport = Arc::new(FakeTransport::new());
    let engine = SyncEngine::new(
        EngineConfig::default(),
        Arc::clone(&outbox),
        None,
        Some(transport.clone() as Arc<dyn driftbox_sync::SyncTransport>),
    )
    .expect("valid config");

    let now_ms = SystemClock.millis_since_epoch();
    let op = Operation::new("http.post", "/api/messages", r#"{"text":"hello offline"}"#);
    let id = outbox.enqueue(op, now_ms).expect("enqueue");
    println!("enqueued {id}");

    let processed = engine.tick(now_ms).expect("tick");
    println!("tick processed {processed} operation(s), transport calls: {}", transport.call_count());

    let op = outbox.store().get(&id).expect("store").expect("op");
    println!("final status: {} (snapshot at {})", op.status, dir.join("outbox.json").display());
}
