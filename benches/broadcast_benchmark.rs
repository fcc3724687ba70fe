use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lite_broadcast::{Sender, SharedSender};
use std::time::Duration;
use tokio::sync::broadcast;

/// Benchmark: Send with no receivers (pure publish cost)
/// 基准测试：无接收器时的发送（纯发布开销）
fn bench_send_no_receivers(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast_send_no_receivers");

    group.bench_function("lite_broadcast", |b| {
        let mut sender = Sender::new();
        b.iter(|| {
            sender.send(42u64);
        });
    });

    group.bench_function("lite_broadcast_shared", |b| {
        let sender = SharedSender::new();
        b.iter(|| {
            sender.send(42u64);
        });
    });

    group.bench_function("tokio_broadcast", |b| {
        let (tx, _) = broadcast::channel::<u64>(1024);
        b.iter(|| {
            let _ = tx.send(42);
        });
    });

    group.finish();
}

/// Benchmark: Send a batch, then drain it from every receiver on the same thread
/// 基准测试：批量发送，然后在同一线程中由每个接收器取完
fn bench_fan_out_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast_fan_out_drain");
    const MESSAGES: u64 = 256;

    for receivers in [1usize, 16, 256].iter() {
        group.bench_with_input(
            BenchmarkId::new("lite_broadcast", receivers),
            receivers,
            |b, &receivers| {
                b.iter_custom(|iters| {
                    let mut total_duration = Duration::from_secs(0);

                    for _ in 0..iters {
                        let mut sender = Sender::new();
                        let mut rxs: Vec<_> = (0..receivers).map(|_| sender.receiver()).collect();

                        let start = std::time::Instant::now();

                        for i in 0..MESSAGES {
                            sender.send(i);
                        }
                        for rx in rxs.iter_mut() {
                            for _ in 0..MESSAGES {
                                let _value = rx.try_recv().unwrap();
                            }
                        }

                        total_duration += start.elapsed();
                    }

                    total_duration
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("tokio_broadcast", receivers),
            receivers,
            |b, &receivers| {
                b.iter_custom(|iters| {
                    let mut total_duration = Duration::from_secs(0);

                    for _ in 0..iters {
                        let (tx, _) = broadcast::channel::<u64>(MESSAGES as usize);
                        let mut rxs: Vec<_> = (0..receivers).map(|_| tx.subscribe()).collect();

                        let start = std::time::Instant::now();

                        for i in 0..MESSAGES {
                            let _ = tx.send(i);
                        }
                        for rx in rxs.iter_mut() {
                            for _ in 0..MESSAGES {
                                let _value = rx.try_recv().unwrap();
                            }
                        }

                        total_duration += start.elapsed();
                    }

                    total_duration
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: Cross-task delivery to concurrently waiting receivers
/// 基准测试：向并发等待的接收器跨任务投递
fn bench_cross_task_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast_cross_task_fan_out");
    const MESSAGES: u64 = 64;

    for receivers in [4usize, 64].iter() {
        group.bench_with_input(
            BenchmarkId::new("lite_broadcast", receivers),
            receivers,
            |b, &receivers| {
                let runtime = tokio::runtime::Runtime::new().unwrap();

                b.to_async(&runtime).iter_custom(|iters| async move {
                    let mut total_duration = Duration::from_secs(0);

                    for _ in 0..iters {
                        let mut sender = Sender::new();
                        let handles: Vec<_> = (0..receivers)
                            .map(|_| {
                                let mut rx = sender.receiver();
                                tokio::spawn(async move {
                                    while rx.recv_async().await.is_ok() {}
                                })
                            })
                            .collect();

                        let start = std::time::Instant::now();

                        for i in 0..MESSAGES {
                            sender.send(i);
                        }
                        drop(sender);
                        for handle in handles {
                            handle.await.unwrap();
                        }

                        total_duration += start.elapsed();
                    }

                    total_duration
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("tokio_broadcast", receivers),
            receivers,
            |b, &receivers| {
                let runtime = tokio::runtime::Runtime::new().unwrap();

                b.to_async(&runtime).iter_custom(|iters| async move {
                    let mut total_duration = Duration::from_secs(0);

                    for _ in 0..iters {
                        let (tx, _) = broadcast::channel::<u64>(MESSAGES as usize);
                        let handles: Vec<_> = (0..receivers)
                            .map(|_| {
                                let mut rx = tx.subscribe();
                                tokio::spawn(async move {
                                    while rx.recv().await.is_ok() {}
                                })
                            })
                            .collect();

                        let start = std::time::Instant::now();

                        for i in 0..MESSAGES {
                            let _ = tx.send(i);
                        }
                        drop(tx);
                        for handle in handles {
                            handle.await.unwrap();
                        }

                        total_duration += start.elapsed();
                    }

                    total_duration
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_send_no_receivers,
    bench_fan_out_drain,
    bench_cross_task_fan_out,
);

criterion_main!(benches);
