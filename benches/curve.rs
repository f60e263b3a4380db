use criterion::{criterion_group, criterion_main, Criterion};
use pharmtrack::prelude::pk::*;
use pharmtrack::prelude::*;
use std::hint::black_box;

const HOUR: i64 = 3_600_000;

fn example_medication() -> Medication {
    Medication::new("sertraline", "Sertraline", PkParameters::new(26.0, 20.0, 0.44, 0.9))
}

/// Three months of daily morning doses
fn example_doses() -> Vec<MedicationDose> {
    (0..90)
        .map(|day| MedicationDose::new(format!("d{day}"), "sertraline", day * 24 * HOUR + 8 * HOUR, 50.0))
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let medication = example_medication();
    let doses = example_doses();
    let end = (90 * 24 * HOUR) as f64;

    c.bench_function("curve 500 points, 90 doses", |b| {
        b.iter(|| {
            build_concentration_curve(
                black_box(&medication),
                black_box(&doses),
                0.0,
                end,
                Some(500),
                None,
            )
            .unwrap()
        })
    });

    let cache = ConcentrationCache::default();
    let request = CurveRequest::new(0.0, end).with_points(500);
    c.bench_function("cached curve 500 points, 90 doses", |b| {
        b.iter(|| {
            cache
                .get_cached_curve(black_box(&medication), black_box(&doses), &request)
                .unwrap()
        })
    });

    let mood: Vec<MoodEntry> = (0..90)
        .map(|day| MoodEntry::new(day * 24 * HOUR + 20 * HOUR, 5.0 + (day % 4) as f64))
        .collect();
    c.bench_function("insights 90 days", |b| {
        b.iter(|| {
            pharmtrack::generate_insights_report(
                black_box(std::slice::from_ref(&medication)),
                black_box(&doses),
                black_box(&mood),
                90,
            )
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
