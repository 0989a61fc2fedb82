//! Benchmarks for the feature indicators.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trading_core::traits::{HlcIndicator, Indicator};
use trading_core::Bar;
use trading_indicators::{calculate_feature, simd, Adx, FeatureSpec, Rsi, WaveTrend};

fn generate_bars(size: usize) -> Vec<Bar> {
    (0..size)
        .map(|i| {
            let c = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            Bar::new(i as i64 * 60_000, c, c + 0.5, c - 0.5, c, 1.0)
        })
        .collect()
}

fn benchmark_oscillators(c: &mut Criterion) {
    let mut group = c.benchmark_group("Oscillators");

    for size in [1000, 10000].iter() {
        let bars = generate_bars(*size);
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();

        group.bench_with_input(BenchmarkId::new("rsi", size), &close, |b, close| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(close)))
        });

        group.bench_with_input(BenchmarkId::new("adx", size), &close, |b, close| {
            let adx = Adx::new(14);
            b.iter(|| adx.calculate(black_box(&high), black_box(&low), black_box(close)))
        });

        group.bench_with_input(BenchmarkId::new("wavetrend", size), &close, |b, close| {
            let wt = WaveTrend::new(10, 12);
            b.iter(|| wt.series(black_box(&high), black_box(&low), black_box(close)))
        });
    }

    group.finish();
}

fn benchmark_feature_window(c: &mut Criterion) {
    let bars = generate_bars(1000);
    let specs = FeatureSpec::defaults();

    c.bench_function("feature_window_1000", |b| {
        b.iter(|| {
            specs
                .iter()
                .filter_map(|spec| calculate_feature(spec, black_box(&bars)))
                .count()
        })
    });
}

fn benchmark_kernels(c: &mut Criterion) {
    let data: Vec<f64> = (0..100_000).map(|i| (i as f64 * 0.01).cos()).collect();

    c.bench_function("minmax_simd_100k", |b| b.iter(|| simd::minmax_simd(black_box(&data))));
    c.bench_function("dot_product_simd_100k", |b| {
        b.iter(|| simd::dot_product_simd(black_box(&data), black_box(&data)))
    });
}

criterion_group!(benches, benchmark_oscillators, benchmark_feature_window, benchmark_kernels);
criterion_main!(benches);
