//! Lock manager contention benchmarks
//!
//! Measures acquire/release cost under different contention patterns:
//! - Uncontended: one thread, fresh transaction per iteration
//! - Disjoint: each thread locks its own resource
//! - Shared: all threads lock the same resource in shared mode
//! - Exclusive: all threads lock the same resource exclusively
//!
//! Run with: cargo bench --bench lock_contention

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use strata_lock::{LockManager, TxnIdAllocator};

const ITERATIONS_PER_THREAD: usize = 1000;

fn bench_uncontended(c: &mut Criterion) {
    let mut group = c.benchmark_group("locking/uncontended");
    let manager = LockManager::with_parallel(1);
    let ids = TxnIdAllocator::new();

    for width in [1usize, 4, 16] {
        let names: Vec<String> = (0..width).map(|i| format!("db{}", i)).collect();
        group.bench_function(BenchmarkId::new("acquire_release", width), |b| {
            b.iter(|| {
                let txn = ids.next_id();
                manager.acquire(txn, names.clone(), true).unwrap();
                manager.release(txn).unwrap();
            })
        });
    }
    group.finish();
}

fn run_threads(threads: usize, names_for: impl Fn(usize) -> Vec<String>, updating: bool) {
    let manager = Arc::new(LockManager::with_parallel(threads));
    let ids = Arc::new(TxnIdAllocator::new());

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let manager = Arc::clone(&manager);
            let ids = Arc::clone(&ids);
            let names = names_for(t);
            std::thread::spawn(move || {
                for _ in 0..ITERATIONS_PER_THREAD {
                    let txn = ids.next_id();
                    manager.acquire(txn, names.clone(), updating).unwrap();
                    manager.release(txn).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("locking/contention");
    group.measurement_time(Duration::from_secs(10));

    for threads in [1usize, 2, 4, 8] {
        group.throughput(Throughput::Elements((threads * ITERATIONS_PER_THREAD) as u64));

        group.bench_function(BenchmarkId::new("disjoint", threads), |b| {
            b.iter(|| run_threads(threads, |t| vec![format!("db{}", t)], true))
        });
        group.bench_function(BenchmarkId::new("shared", threads), |b| {
            b.iter(|| run_threads(threads, |_| vec!["db".to_string()], false))
        });
        group.bench_function(BenchmarkId::new("exclusive", threads), |b| {
            b.iter(|| run_threads(threads, |_| vec!["db".to_string()], true))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_uncontended, bench_contention);
criterion_main!(benches);
