use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use xg_lab::evaluation::roc_curve;
use xg_lab::features::FeatureSet;
use xg_lab::fit::{FitConfig, fit};
use xg_lab::geometry::PitchFrame;
use xg_lab::shot::{ShotRecord, records_from_raw};
use xg_lab::surface::default_surface;
use xg_lab::synthetic::{SyntheticConfig, generate_shots};
use xg_lab::wyscout::{ShotFilter, parse_events_json};

fn sample_shots(shots: usize) -> Vec<ShotRecord> {
    let raw = generate_shots(&SyntheticConfig {
        shots,
        ..SyntheticConfig::default()
    });
    records_from_raw(&raw, &PitchFrame::default()).expect("valid synthetic shots")
}

fn bench_fit_full_model(c: &mut Criterion) {
    let shots = sample_shots(5_000);
    let features = FeatureSet::full();
    let cfg = FitConfig::default();
    c.bench_function("fit_full_model_5k", |b| {
        b.iter(|| {
            let coeffs = fit(black_box(&shots), &features, &cfg).unwrap();
            black_box(coeffs.intercept());
        })
    });
}

fn bench_roc_curve(c: &mut Criterion) {
    let shots = sample_shots(5_000);
    let features = FeatureSet::full();
    let coeffs = fit(&shots, &features, &FitConfig::default()).unwrap();
    c.bench_function("roc_curve_100_thresholds", |b| {
        b.iter(|| {
            let roc = roc_curve(black_box(&shots), &coeffs, &features, 100).unwrap();
            black_box(roc.len());
        })
    });
}

fn bench_probability_surface(c: &mut Criterion) {
    let shots = sample_shots(2_000);
    let coeffs = fit(&shots, &FeatureSet::full(), &FitConfig::default()).unwrap();
    c.bench_function("probability_surface_68x68", |b| {
        b.iter(|| {
            let surface = default_surface(black_box(&coeffs)).unwrap();
            black_box(surface.values.len());
        })
    });
}

fn bench_events_parse(c: &mut Criterion) {
    c.bench_function("wyscout_events_parse", |b| {
        b.iter(|| {
            let out = parse_events_json(black_box(EVENTS_JSON), ShotFilter::default()).unwrap();
            black_box(out.shots.len());
        })
    });
}

criterion_group!(
    perf,
    bench_fit_full_model,
    bench_roc_curve,
    bench_probability_surface,
    bench_events_parse
);
criterion_main!(perf);

static EVENTS_JSON: &str = include_str!("../tests/fixtures/wyscout_events.json");
