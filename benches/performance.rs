//! Performance benchmarks for the subscription manager.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use leasehold::{start_fn, BoxError, Cleanup, ManagerConfig, SubscriptionManager};
use tokio::runtime::Runtime;

fn ready_start() -> leasehold::StartFn {
    start_fn(|| async { Ok::<_, BoxError>(Cleanup::noop()) })
}

fn create_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Benchmark lease churn against an already ready resource
fn bench_lease_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("lease_churn");

    for holders in [1, 16, 256] {
        group.bench_with_input(BenchmarkId::new("holders", holders), &holders, |b, &n| {
            let runtime = create_runtime();
            let manager = SubscriptionManager::with_runtime(
                runtime.handle().clone(),
                ManagerConfig::named("bench"),
                ready_start(),
            );

            // Keep the session alive so churn never hits zero
            let held: Vec<_> = (0..n).map(|_| manager.subscribe()).collect();
            runtime.block_on(async {
                held[0].ready().await.unwrap();
            });

            b.iter(|| {
                let lease = manager.subscribe();
                black_box(lease.id());
                drop(lease);
            });
        });
    }

    group.finish();
}

/// Benchmark complete sessions: start, ready, release
fn bench_full_session(c: &mut Criterion) {
    let runtime = create_runtime();
    let manager = SubscriptionManager::with_runtime(
        runtime.handle().clone(),
        ManagerConfig::named("bench"),
        ready_start(),
    );

    c.bench_function("full_session", |b| {
        b.iter(|| {
            let lease = manager.subscribe();
            runtime.block_on(async {
                black_box(lease.ready().await.unwrap());
            });
            drop(lease);
        });
    });
}

criterion_group!(benches, bench_lease_churn, bench_full_session);
criterion_main!(benches);
