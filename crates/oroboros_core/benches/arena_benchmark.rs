//! # Arena Performance Benchmark
//!
//! ARCHITECT'S REQUIREMENTS:
//! - 4096 small snapshots per frame
//! - Reset between frames is free
//! - 0 allocations while filling
//!
//! Run with: `cargo bench --package oroboros_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use oroboros_core::Arena;

/// Commands recorded per simulated frame.
const SNAPSHOTS_PER_FRAME: usize = 4096;

/// Benchmark: fill one frame's worth of fixed-size payloads, then reset.
fn bench_fill_and_reset(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_fill_and_reset");

    for payload_bytes in [16usize, 64, 256] {
        let payload = vec![0xA5u8; payload_bytes];
        let mut arena = Arena::new(SNAPSHOTS_PER_FRAME * (payload_bytes + 8));

        group.throughput(Throughput::Bytes((SNAPSHOTS_PER_FRAME * payload_bytes) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(payload_bytes),
            &payload_bytes,
            |b, _| {
                b.iter(|| {
                    for _ in 0..SNAPSHOTS_PER_FRAME {
                        black_box(arena.alloc_bytes(black_box(&payload)));
                    }
                    arena.reset();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: vertex-style blob snapshots (the expensive case).
fn bench_blob_snapshot(c: &mut Criterion) {
    let vertices: Vec<[f32; 4]> = (0..1024).map(|i| [i as f32, 0.0, 0.0, 1.0]).collect();
    let mut arena = Arena::new(64 * 1024);

    c.bench_function("arena_blob_snapshot_1024_vertices", |b| {
        b.iter(|| {
            black_box(arena.alloc_slice(black_box(&vertices)));
            arena.reset();
        });
    });
}

criterion_group!(benches, bench_fill_and_reset, bench_blob_snapshot);
criterion_main!(benches);
