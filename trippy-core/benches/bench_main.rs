//! Benchmarks of the KPI queries on a synthetic scenario.
//!
//! Run with: cargo bench -p trippy_core --bench bench_main

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use trippy_core::prelude::*;

const N_TRIPS: usize = 50_000;
const MODES: [&str; 5] = ["car", "pt", "walk", "bike", "drt"];

fn synthetic_scenario() -> Scenario {
    let mut trips = Table::new();
    trips
        .insert_column(
            "person_id",
            (0..N_TRIPS).map(|i| format!("p{}", i / 3)).collect::<Vec<_>>(),
        )
        .unwrap();
    trips
        .insert_column(
            "main_mode",
            (0..N_TRIPS).map(|i| MODES[i % MODES.len()]).collect::<Vec<_>>(),
        )
        .unwrap();
    trips
        .insert_column(
            "start_time",
            (0..N_TRIPS)
                .map(|i| (i % 86_400) as f64)
                .collect::<Vec<_>>(),
        )
        .unwrap();
    trips
        .insert_column(
            "travel_time",
            (0..N_TRIPS).map(|i| (300 + i % 3_600) as f64).collect::<Vec<_>>(),
        )
        .unwrap();

    let mut legs = Table::new();
    legs.insert_column(
        "trip_id",
        (0..N_TRIPS * 3).map(|i| (i / 3).to_string()).collect::<Vec<_>>(),
    )
    .unwrap();
    legs.insert_column(
        "mode",
        (0..N_TRIPS * 3)
            .map(|i| match i % 3 {
                1 => MODES[(i / 3) % MODES.len()],
                _ => "walk",
            })
            .collect::<Vec<_>>(),
    )
    .unwrap();
    legs.insert_column(
        "line_id",
        (0..N_TRIPS * 3)
            .map(|i| (i % 3 == 1).then(|| format!("L{}", i % 40)))
            .collect::<Vec<_>>(),
    )
    .unwrap();
    legs.insert_column(
        "routed_distance",
        (0..N_TRIPS * 3).map(|i| (i % 10_000) as f64).collect::<Vec<_>>(),
    )
    .unwrap();

    let mut scenario = Scenario::new("bench");
    scenario.add_data(TableKind::Trips, trips).unwrap();
    scenario.add_data(TableKind::Legs, legs).unwrap();
    scenario
}

fn bench_volume(c: &mut Criterion) {
    let scenario = synthetic_scenario();
    let options = ModeOptions::new();
    let mut group = c.benchmark_group("volume");

    group.bench_function("modal_split_volume", |b| {
        b.iter(|| black_box(scenario.modal_split(SplitType::Volume, &options).unwrap()));
    });
    group.bench_function("modal_split_performance", |b| {
        b.iter(|| black_box(scenario.modal_split(SplitType::Performance, &options).unwrap()));
    });
    group.bench_function("trips_day", |b| {
        b.iter(|| black_box(scenario.trips_day(Some(15), "start_time").unwrap()));
    });

    group.finish();
}

fn bench_travel_stats(c: &mut Criterion) {
    let scenario = synthetic_scenario();

    c.bench_function("travel_time_stats_per_mode", |b| {
        b.iter(|| {
            black_box(
                scenario
                    .travel_time_stats(StatsFor::Trips, true, None)
                    .unwrap(),
            )
        });
    });
}

fn bench_intermodal(c: &mut Criterion) {
    let scenario = DrtScenario::new(synthetic_scenario(), None);

    c.bench_function("drt_intermodal_analysis", |b| {
        b.iter(|| black_box(scenario.drt_intermodal_analysis(None).unwrap()));
    });
}

criterion_group!(benches, bench_volume, bench_travel_stats, bench_intermodal);
criterion_main!(benches);
