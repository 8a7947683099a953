use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use crossbeam_utils::thread::scope;
use msq_spsc::{channel, MSQueue, Retain};

const BATCH: i16 = 10_000;

fn single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");
    group.throughput(Throughput::Elements(BATCH as u64));

    group.bench_function("epoch", |b| {
        let q = MSQueue::new();
        b.iter(|| {
            for i in 0..BATCH {
                q.push(i);
            }
            while let Some(v) = q.pop() {
                black_box(v);
            }
        })
    });

    group.bench_function("retain", |b| {
        b.iter(|| {
            let q = MSQueue::with_reclaim(Retain::default());
            for i in 0..BATCH {
                q.push(i);
            }
            while let Some(v) = q.pop() {
                black_box(v);
            }
        })
    });

    group.finish();
}

fn two_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("two_threads");
    group.throughput(Throughput::Elements(BATCH as u64));

    group.bench_function("channel", |b| {
        b.iter(|| {
            let (tx, rx) = channel();
            scope(|s| {
                s.spawn(move |_| {
                    for i in 0..BATCH {
                        tx.push(i);
                    }
                });
                let mut seen = 0;
                while seen < BATCH {
                    if let Some(v) = rx.pop() {
                        black_box(v);
                        seen += 1;
                    }
                }
            })
            .unwrap();
        })
    });

    group.finish();
}

criterion_group!(benches, single_thread, two_threads);
criterion_main!(benches);
