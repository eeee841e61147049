//! Scoring benchmarks
//!
//! - Factor analysis and composite scoring by window size
//! - Feature extraction
//! - Heuristic prediction

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use telematics_common::{DrivingEvents, RoadType, TelemetryRecord};
use telematics_scoring::{HeuristicPredictor, MlFeatureExtractor, TraditionalScorer};

fn window(size: usize) -> Vec<TelemetryRecord> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..size)
        .map(|i| {
            let road = if i % 3 == 0 { RoadType::City } else { RoadType::Highway };
            TelemetryRecord::new(
                start + Duration::seconds(i as i64 * 15),
                35.0 + (i % 50) as f64,
                format!("trip-{}", i / 120),
            )
            .with_road_type(road)
            .with_events(DrivingEvents {
                harsh_braking: i % 97 == 0,
                phone_usage: i % 211 == 0,
                ..Default::default()
            })
        })
        .collect()
}

fn bench_traditional(c: &mut Criterion) {
    let mut group = c.benchmark_group("traditional");
    let scorer = TraditionalScorer::default();

    for size in [100usize, 1_000, 10_000] {
        let records = window(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("score", size), &records, |b, records| {
            b.iter(|| scorer.score(black_box(records)))
        });
    }

    group.finish();
}

fn bench_ml_stage(c: &mut Criterion) {
    let mut group = c.benchmark_group("ml");
    let extractor = MlFeatureExtractor::default();
    let predictor = HeuristicPredictor::new();
    let records = window(1_000);

    group.bench_function("extract", |b| {
        b.iter(|| extractor.extract(black_box(&records)))
    });

    if let Ok(features) = extractor.extract(&records) {
        group.bench_function("heuristic", |b| {
            b.iter(|| predictor.evaluate(black_box(&features)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_traditional, bench_ml_stage);
criterion_main!(benches);
