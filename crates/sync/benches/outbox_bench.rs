//! Outbox benchmarks.
//!
//! Covers the enqueue/claim/complete cycle against the in-memory store and
//! the retry delay computation.
//!
//! Run with: `cargo bench --bench outbox_bench -p driftbox-sync`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use driftbox_sync::{MemoryOutboxStore, Operation, Outbox, OutboxConfig, RetryPolicy};

fn bench_enqueue_claim_complete(c: &mut Criterion) {
    let mut group = c.benchmark_group("outbox_enqueue_claim_complete");

    for &count in &[256usize, 1024] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("memory_store", count), &count, |b, &count| {
            b.iter(|| {
                let outbox =
                    Outbox::new(OutboxConfig::default(), Arc::new(MemoryOutboxStore::new()));

                let mut ids = Vec::with_capacity(count);
                for idx in 0..count {
                    let op = Operation::new("http.post", format!("/api/{idx}"), "{}");
                    ids.push(outbox.enqueue(op, 0).expect("enqueue"));
                }

                for id in &ids {
                    assert!(outbox.claim(id, 1).expect("claim"));
                    assert!(outbox.complete(id, 2).expect("complete"));
                }
            });
        });
    }

    group.finish();
}

fn bench_peek_ready(c: &mut Criterion) {
    let outbox = Outbox::new(OutboxConfig::default(), Arc::new(MemoryOutboxStore::new()));
    for idx in 0..1024 {
        // Half ready now, half scheduled for later.
        let op = Operation::new("http.post", format!("/api/{idx}"), "{}")
            .with_next_retry_at_ms(if idx % 2 == 0 { 1 } else { 1_000_000 });
        outbox.enqueue(op, 1).expect("enqueue");
    }

    c.bench_function("outbox_peek_ready_25_of_1024", |b| {
        b.iter(|| {
            let ready = outbox.peek_ready(black_box(2), 25).expect("peek");
            black_box(ready);
        });
    });
}

fn bench_compute_delay(c: &mut Criterion) {
    let policy = RetryPolicy::default();

    c.bench_function("retry_compute_delay_ms", |b| {
        b.iter(|| {
            for attempt in 0..16u32 {
                black_box(policy.compute_delay_ms(black_box(attempt)));
            }
        });
    });
}

criterion_group!(benches, bench_enqueue_claim_complete, bench_peek_ready, bench_compute_delay);
criterion_main!(benches);
