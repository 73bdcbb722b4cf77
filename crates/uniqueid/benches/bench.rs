use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};
use tokio::runtime::Builder;
use uniqueid::{
    KeyRegistry, MachineId, MemoryCounterStore, Poll, SharedCounterGenerator, SnowflakeGenerator,
    TimeSource, WallClock, EPOCH_MILLIS,
};

struct FixedMockTime {
    millis: u64,
}

impl TimeSource<u64> for FixedMockTime {
    fn current_millis(&self) -> u64 {
        EPOCH_MILLIS + self.millis
    }
}

// Number of IDs generated per benchmark iteration. With a fixed clock this is
// exactly one millisecond's worth of sequence values.
const TOTAL_IDS: usize = 4096;

fn machine_id() -> MachineId {
    MachineId::try_from(1).unwrap()
}

/// Hot path: a fixed clock means every poll is `Ready`.
fn benchmark_mock_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("mock/sequential/snowflake");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = SnowflakeGenerator::new(machine_id(), FixedMockTime { millis: 1 });
                for _ in 0..TOTAL_IDS {
                    match generator.try_poll_id() {
                        Ok(Poll::Ready { id }) => {
                            black_box(id);
                        }
                        _ => unreachable!(),
                    }
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Wall clock with spinning on sequence exhaustion.
fn benchmark_wall_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("wall/sequential/snowflake");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let generator = SnowflakeGenerator::new(machine_id(), WallClock::new());
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(generator.generate().unwrap());
            }
        });
    });

    group.finish();
}

/// One generator shared across threads, fixed clock.
fn benchmark_mock_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("mock/contended/snowflake");

    for thread_count in [1, 2, 4, 8, 16] {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(format!("elems/{TOTAL_IDS}/threads/{thread_count}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();

                for _ in 0..iters {
                    let generator = SnowflakeGenerator::new(machine_id(), FixedMockTime { millis: 1 });
                    let barrier = Barrier::new(thread_count + 1);
                    scope(|s| {
                        for _ in 0..thread_count {
                            s.spawn(|| {
                                barrier.wait();
                                for _ in 0..ids_per_thread {
                                    match generator.try_poll_id() {
                                        Ok(Poll::Ready { id }) => {
                                            black_box(id);
                                        }
                                        _ => unreachable!(),
                                    }
                                }
                            });
                        }
                        barrier.wait();
                    });
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

/// One generator shared across threads, wall clock with spinning.
fn benchmark_wall_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("wall/contended/snowflake");

    for thread_count in [1, 2, 4, 8, 16] {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(format!("elems/{TOTAL_IDS}/threads/{thread_count}"), |b| {
            let generator = Arc::new(SnowflakeGenerator::new(machine_id(), WallClock::new()));
            b.iter_custom(|iters| {
                let start = Instant::now();

                for _ in 0..iters {
                    scope(|s| {
                        for _ in 0..thread_count {
                            let generator = Arc::clone(&generator);
                            s.spawn(move || {
                                for _ in 0..ids_per_thread {
                                    black_box(generator.generate().unwrap());
                                }
                            });
                        }
                    });
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Shared counter against the in-memory store on a tokio runtime.
fn benchmark_counter_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory/sequential/counter");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let runtime = Builder::new_current_thread().build().unwrap();
    let registry: KeyRegistry = "ORDER,USER".parse().unwrap();
    let generator = SharedCounterGenerator::new(registry, MemoryCounterStore::new());

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.to_async(&runtime).iter(|| async {
            for _ in 0..TOTAL_IDS {
                black_box(generator.generate("ORDER").await.unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_mock_sequential,
    benchmark_wall_sequential,
    benchmark_mock_contended,
    benchmark_wall_contended,
    benchmark_counter_memory,
);
criterion_main!(benches);
