//! Benchmarks for the gap-fill relaxation kernel.
//!
//! Run with: cargo bench --package remap -- fill
//! Or: cargo bench --package remap --bench fill_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use remap::{fill_grid, FillConfig};

const MISSING: f64 = 1.0e36;

/// Generate a temperature-like field with a rectangular block of missing
/// cells, mimicking an ocean region outside the forcing domain.
fn generate_field_with_gap(ny: usize, nx: usize) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    let mut data = vec![0.0f64; ny * nx];

    for j in 0..ny {
        for i in 0..nx {
            let lat_factor = (j as f64 / ny as f64 - 0.5) * 40.0;
            let lon_factor = ((i as f64 / nx as f64) * std::f64::consts::PI * 2.0).sin() * 5.0;
            let noise = rng.gen_range(-1.0..1.0);
            data[j * nx + i] = 260.0 + lat_factor + lon_factor + noise;
        }
    }

    // knock out the lower-right quadrant
    for j in ny / 2..ny {
        for i in nx / 2..nx {
            data[j * nx + i] = MISSING;
        }
    }
    data
}

fn bench_fill_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_grid");

    for &size in &[64usize, 128, 256] {
        let field = generate_field_with_gap(size, size);
        let config = FillConfig {
            max_iter: 500,
            ..FillConfig::default()
        };

        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &field, |b, field| {
            b.iter(|| {
                let mut work = field.clone();
                let stats = fill_grid(black_box(&mut work), size, size, &config);
                black_box(stats)
            })
        });
    }

    group.finish();
}

fn bench_fill_init_only(c: &mut Criterion) {
    // max_iter = 0 isolates the seeding pass from the relaxation sweeps
    let size = 256usize;
    let field = generate_field_with_gap(size, size);
    let config = FillConfig {
        max_iter: 0,
        ..FillConfig::default()
    };

    c.bench_function("fill_grid_init_only_256", |b| {
        b.iter(|| {
            let mut work = field.clone();
            fill_grid(black_box(&mut work), size, size, &config)
        })
    });
}

criterion_group!(benches, bench_fill_grid, bench_fill_init_only);
criterion_main!(benches);
