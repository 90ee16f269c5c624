//! Benchmark module for the average colour kernels.
//! Run with: cargo bench -p avgcolor --features bench --bench average

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput};
use strum::IntoEnumIterator;

use super::{Tier, average_color, average_color_with};

/// Register average colour benchmarks with Criterion.
pub fn benchmarks(c: &mut Criterion) {
    benchmark_tiers(c);
    benchmark_dispatch(c);
}

/// Every supported tier on uniform buffers, from cache-resident to
/// bandwidth-bound sizes.
fn benchmark_tiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("average_color_tiers");

    for size in [4_096usize, 1 << 20, 10_000_000] {
        let pixels = vec![0xBEEF_FEEBu32; size];

        group.throughput(Throughput::Bytes((size * size_of::<u32>()) as u64));

        for tier in Tier::iter().filter(|tier| tier.is_supported()) {
            group.bench_function(BenchmarkId::new(tier.to_string(), size), |b| {
                b.iter(|| black_box(average_color_with(tier, black_box(&pixels))))
            });
        }
    }

    group.finish();
}

/// Dispatched entry point on buffers whose length exercises every tail tier.
fn benchmark_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("average_color");

    for size in [31usize, 1_023, 65_535] {
        let pixels: Vec<u32> = (0..size as u32)
            .map(|i| i.wrapping_mul(0x9E37_79B9))
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| black_box(average_color(black_box(&pixels))))
        });
    }

    group.finish();
}
