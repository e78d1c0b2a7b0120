//! Reconciliation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tasksync_bench::{entry_feed, item_feed};
use tasksync_engine::{MemoryJournal, Reconciler, RetryConfig, SyncConfig, SyncManager, TaskDomain};
use tasksync_protocol::{CollectionDescriptor, CollectionKind, ProtocolMode};
use tasksync_store::{FileStore, MemoryStore};

/// Benchmark applying a current-protocol feed to an empty store.
fn bench_apply_items(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_items");

    for count in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let feed = item_feed(count, count / 2);

            b.iter(|| {
                let mut store = MemoryStore::new();
                let mut reconciler = Reconciler::<TaskDomain>::new(ProtocolMode::Current);
                for record in &feed {
                    black_box(reconciler.apply_change(record, &mut store).unwrap());
                }
            });
        });
    }
    group.finish();
}

/// Benchmark applying a legacy feed, where lookups go by UID.
fn bench_apply_entries(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_entries");

    for count in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let feed = entry_feed(count, count / 2);

            b.iter(|| {
                let mut store = MemoryStore::new();
                let mut reconciler = Reconciler::<TaskDomain>::new(ProtocolMode::Legacy);
                for record in &feed {
                    black_box(reconciler.apply_change(record, &mut store).unwrap());
                }
            });
        });
    }
    group.finish();
}

/// Benchmark a full session with per-batch marker commits.
fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");
    group.sample_size(20);

    for batch_size in [10, 100].iter() {
        group.throughput(Throughput::Elements(500));
        group.bench_with_input(
            BenchmarkId::new("memory", batch_size),
            batch_size,
            |b, &batch_size| {
                let journal = MemoryJournal::new();
                for record in item_feed(500, 250) {
                    journal.push_item(record);
                }

                b.iter(|| {
                    let mut manager = SyncManager::<TaskDomain, _, _>::new(
                        SyncConfig::new()
                            .with_fetch_batch_size(batch_size)
                            .with_retry(RetryConfig::no_retry()),
                        CollectionDescriptor::current("/bench/", CollectionKind::Tasks, "bench"),
                        journal.clone(),
                        MemoryStore::new(),
                    );
                    black_box(manager.sync().unwrap());
                });
            },
        );
    }
    group.finish();
}

/// Benchmark a session against the durable file store.
fn bench_file_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_session");
    group.sample_size(10);

    group.bench_function("100_items", |b| {
        let journal = MemoryJournal::new();
        for record in item_feed(100, 100) {
            journal.push_item(record);
        }

        b.iter_batched(
            || tempfile::tempdir().unwrap(),
            |dir| {
                let store = FileStore::open(dir.path()).unwrap();
                let mut manager = SyncManager::<TaskDomain, _, _>::new(
                    SyncConfig::new().with_retry(RetryConfig::no_retry()),
                    CollectionDescriptor::current("/bench/", CollectionKind::Tasks, "bench"),
                    journal.clone(),
                    store,
                );
                black_box(manager.sync().unwrap());
            },
            criterion::BatchSize::PerIteration,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_apply_items,
    bench_apply_entries,
    bench_session,
    bench_file_session,
);

criterion_main!(benches);
