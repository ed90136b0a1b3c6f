//! Benchmarks for the styling pipeline stages.
//!
//! Run with: cargo bench --package raster-pipeline
//! Or: cargo bench --package raster-pipeline --bench pipeline_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use map_common::CrsCode;
use raster_pipeline::{encode_png, reproject, BandExpander, ResamplingMethod};
use test_utils::{create_class_grid, fixtures};

// =============================================================================
// BAND EXPANSION BENCHMARKS
// =============================================================================

fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");
    let colors = fixtures::land_use_colors();

    for size in [256usize, 1024] {
        let source = fixtures::single_band(
            size,
            size,
            create_class_grid(size, size, 16, &[1, 2, 3, 4]),
            None,
        );
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, source| {
            b.iter(|| BandExpander::new(&colors).expand(black_box(source)))
        });
    }

    group.finish();
}

// =============================================================================
// REPROJECTION BENCHMARKS
// =============================================================================

fn bench_reproject(c: &mut Criterion) {
    let mut group = c.benchmark_group("reproject");
    group.sample_size(20);

    let size = 512;
    let source = fixtures::single_band(
        size,
        size,
        create_class_grid(size, size, 16, &[1, 2, 3, 4]),
        Some(-1.0),
    );
    group.throughput(Throughput::Elements((size * size) as u64));

    for (name, target, method) in [
        ("3577_to_3857_nearest", CrsCode::Epsg3857, ResamplingMethod::Nearest),
        ("3577_to_3857_bilinear", CrsCode::Epsg3857, ResamplingMethod::Bilinear),
        ("3577_to_4326_nearest", CrsCode::Epsg4326, ResamplingMethod::Nearest),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| reproject(black_box(&source), target, method))
        });
    }

    group.finish();
}

// =============================================================================
// END-TO-END BENCHMARKS
// =============================================================================

fn bench_expand_reproject_encode(c: &mut Criterion) {
    let colors = fixtures::land_use_colors();
    let source = fixtures::single_band(512, 512, create_class_grid(512, 512, 16, &[1, 2, 3, 4]), None);

    c.bench_function("expand_reproject_png_512", |b| {
        b.iter(|| {
            let rgba = BandExpander::new(&colors).expand(black_box(&source)).unwrap();
            let warped = reproject(&rgba, CrsCode::Epsg3857, ResamplingMethod::Nearest).unwrap();
            encode_png(&warped).unwrap()
        })
    });
}

criterion_group!(benches, bench_expand, bench_reproject, bench_expand_reproject_encode);
criterion_main!(benches);
