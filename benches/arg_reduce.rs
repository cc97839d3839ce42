use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use argreduce::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn pattern_f32(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| ((i * 17 + 3) % 1000) as f32 / 1000.0)
        .collect()
}

fn client(options: PlannerOptions) -> AccelClient {
    AccelClient::with_config(DeviceConfig::default())
        .unwrap()
        .with_options(options)
}

// ---------------------------------------------------------------------------
// Heuristic mode selection across layouts
// ---------------------------------------------------------------------------

fn bench_layouts(c: &mut Criterion) {
    let client = client(PlannerOptions::default());
    let cases: [(&str, &[usize], isize); 6] = [
        ("rows_4096x1024", &[4096, 1024], 1),
        ("short_rows_262144x8", &[262_144, 8], 1),
        ("columns_1024x4096", &[1024, 4096], 0),
        ("long_axis_4x1m", &[4, 1 << 20], 1),
        ("middle_256x256x16", &[256, 256, 16], 1),
        ("middle_64x128x512", &[64, 128, 512], 1),
    ];

    let mut group = c.benchmark_group("argmax_f32");
    for (name, shape, dim) in cases {
        let numel: usize = shape.iter().product();
        let t = Tensor::from_slice(&pattern_f32(numel), shape);
        group.bench_function(name, |b| {
            b.iter(|| black_box(client.argmax(&t, dim, false).unwrap()))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// GroupReduce against a per-row split on the same long-axis input
// ---------------------------------------------------------------------------

fn bench_forced_modes(c: &mut Criterion) {
    let shape = [8usize, 1 << 18];
    let t = Tensor::from_slice(&pattern_f32(shape.iter().product()), &shape);

    let mut group = c.benchmark_group("argmax_long_axis_modes");
    for mode in [TilingMode::ArCutA, TilingMode::GroupReduce] {
        let client = client(PlannerOptions::forced(mode));
        group.bench_with_input(BenchmarkId::from_parameter(mode), &t, |b, t| {
            b.iter(|| black_box(client.max_with_indices(t, 1, false).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layouts, bench_forced_modes);
criterion_main!(benches);
