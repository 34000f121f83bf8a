//! Benchmarks for the batch runner
//!
//! This benchmark measures:
//! - Per-run overhead of partitioning and ordered reassembly
//! - Effect of batch size on a no-op workload
//! - Summary computation over large outcome sets

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use campaign_dispatch::batch::{summarize, BatchRunConfig, BatchRunner, ItemOutcome};

fn bench_run(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("batch_run");

    for batch_size in [1usize, 10, 50] {
        let runner = BatchRunner::with_config(
            BatchRunConfig::new()
                .with_batch_size(batch_size)
                .with_delay_between_batches(std::time::Duration::ZERO),
        );
        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &runner,
            |b, runner| {
                b.to_async(&rt).iter(|| async {
                    let items: Vec<u32> = (0..1000).collect();
                    let out = runner
                        .run(items, |i, _| async move { Ok::<_, String>(i) })
                        .await
                        .unwrap();
                    black_box(out)
                })
            },
        );
    }
    group.finish();
}

fn bench_summarize(c: &mut Criterion) {
    let outcomes: Vec<ItemOutcome<u32>> = (0..10_000)
        .map(|i| {
            if i % 7 == 0 {
                ItemOutcome::failure(format!("NetworkError: item {i}"))
            } else {
                ItemOutcome::success(i)
            }
        })
        .collect();

    c.bench_function("summarize_10k", |b| {
        b.iter(|| black_box(summarize(black_box(&outcomes))))
    });
}

criterion_group!(benches, bench_run, bench_summarize);
criterion_main!(benches);
