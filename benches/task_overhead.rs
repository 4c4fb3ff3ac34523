//! Benchmarks for the cost of one dispatch-and-deliver round trip

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use handoff::prelude::*;
use std::time::Duration;

fn bench_pool_round_trip(c: &mut Criterion) {
    let pool = ThreadPool::with_threads(2).unwrap();
    let looper = Looper::new();

    c.bench_function("pool_round_trip", |b| {
        b.iter(|| {
            AsyncTask::new(|| Ok::<_, ()>(black_box(21) * 2))
                .on_finish(|v| {
                    black_box(v);
                })
                .execute(&pool, &looper)
                .unwrap();
            looper.run_until_idle(Duration::from_secs(1)).unwrap();
        });
    });
}

fn bench_thread_per_task_round_trip(c: &mut Criterion) {
    let executor = ThreadPerTask::default();
    let looper = Looper::new();

    c.bench_function("thread_per_task_round_trip", |b| {
        b.iter(|| {
            AsyncTask::new(|| Ok::<_, ()>(black_box(21) * 2))
                .execute(&executor, &looper)
                .unwrap();
            looper.run_until_idle(Duration::from_secs(1)).unwrap();
        });
    });
}

fn bench_batched_delivery(c: &mut Criterion) {
    let pool = ThreadPool::with_threads(4).unwrap();
    let looper = Looper::new();

    c.bench_function("batched_delivery_100", |b| {
        b.iter(|| {
            for i in 0..100u32 {
                AsyncTask::new(move || Ok::<_, ()>(i))
                    .execute(&pool, &looper)
                    .unwrap();
            }
            looper.run_until_idle(Duration::from_secs(5)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_pool_round_trip,
    bench_thread_per_task_round_trip,
    bench_batched_delivery
);
criterion_main!(benches);
