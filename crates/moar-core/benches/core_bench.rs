//! Criterion benchmarks for moar-core primitives
//!
//! Run with: cargo bench -p moar-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use moar_core::{
    ArgMethod, BiquadFilter, ButtonGestureState, Debouncer, ExponentialSmoother, FilterCurve,
    FilterKind, GestureTiming, TaskScheduler, Xorshift32,
};

const SAMPLE_RATE: f32 = 1000.0 / 5.0;
const BLOCK_SIZES: &[usize] = &[6, 42, 64];

fn generate_levels(size: usize) -> Vec<f32> {
    (0..size).map(|i| ((i * 37) % 128) as f32).collect()
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("BiquadFilter");

    for &block_size in BLOCK_SIZES {
        let input = generate_levels(block_size);
        group.bench_with_input(BenchmarkId::new("process", block_size), &block_size, |b, _| {
            let mut filter = BiquadFilter::new();
            filter.configure(FilterKind::Lowpass, 20.0, SAMPLE_RATE, 0.707);
            b.iter(|| {
                for &sample in &input {
                    black_box(filter.process(black_box(sample)));
                }
            });
        });
    }

    group.bench_function("configure", |b| {
        let mut filter = BiquadFilter::new();
        b.iter(|| {
            black_box(filter.configure(
                FilterKind::Bandpass,
                black_box(1000.0),
                black_box(44_100.0),
                black_box(0.707),
            ))
        });
    });

    group.finish();
}

fn bench_envelope_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("Envelope");

    group.bench_function("arg_combine_all", |b| {
        b.iter(|| {
            for method in ArgMethod::ALL {
                black_box(method.combine(black_box(100), black_box(30)));
            }
        });
    });

    group.bench_function("curve_apply_all", |b| {
        let mut rng = Xorshift32::default();
        b.iter(|| {
            for curve in FilterCurve::ALL {
                black_box(curve.apply(black_box(64), &mut rng));
            }
        });
    });

    group.finish();
}

fn bench_inputs(c: &mut Criterion) {
    let mut group = c.benchmark_group("Inputs");

    group.bench_function("smoother_42_channels", |b| {
        let mut smoothers = [ExponentialSmoother::default(); 42];
        let levels = generate_levels(42);
        b.iter(|| {
            for (smoother, &raw) in smoothers.iter_mut().zip(&levels) {
                black_box(smoother.update(black_box(raw * 8.0)));
            }
        });
    });

    group.bench_function("debounce_and_gesture", |b| {
        let timing = GestureTiming::default();
        let mut debouncer = Debouncer::new();
        let mut gesture = ButtonGestureState::new();
        let mut now = 0u32;
        b.iter(|| {
            now = now.wrapping_add(1);
            let raw = (now / 700) % 2 == 0;
            debouncer.update(raw, now, 50);
            black_box(gesture.step(debouncer.is_pressed(), now, &timing));
        });
    });

    group.finish();
}

fn tick(counter: &mut u64) {
    *counter += 1;
}

fn bench_scheduler(c: &mut Criterion) {
    c.bench_function("scheduler_update_8_tasks", |b| {
        let mut scheduler = TaskScheduler::<u64, 8>::new();
        for period in 1..=8 {
            scheduler.add(tick, period);
        }
        let mut counter = 0u64;
        let mut now = 0u32;
        b.iter(|| {
            now = now.wrapping_add(1);
            black_box(scheduler.update(now, &mut counter));
        });
    });
}

criterion_group!(
    benches,
    bench_biquad,
    bench_envelope_math,
    bench_inputs,
    bench_scheduler
);
criterion_main!(benches);
