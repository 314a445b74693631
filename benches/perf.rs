use std::hint::black_box;

use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;

use betsim_terminal::dataset;
use betsim_terminal::fake_feed;
use betsim_terminal::record::RawRow;
use betsim_terminal::simulate::{SimParams, simulate};
use betsim_terminal::stats::summarize;

fn season_rows(days: usize) -> (Vec<RawRow>, SimParams) {
    let start = NaiveDate::from_ymd_opt(2024, 11, 22).unwrap();
    let mut rng = fake_feed::seeded_rng(17);
    let rows = fake_feed::generate_history(&mut rng, start, days);
    (rows, SimParams::new(start))
}

fn bench_simulate_season(c: &mut Criterion) {
    let (rows, params) = season_rows(170);
    c.bench_function("simulate_full_season", |b| {
        b.iter(|| {
            let out = simulate(black_box(&rows), black_box(&params)).unwrap();
            black_box(out.len());
        })
    });
}

fn bench_summarize(c: &mut Criterion) {
    let (rows, params) = season_rows(170);
    let sim_rows = simulate(&rows, &params).unwrap();
    c.bench_function("summarize_season", |b| {
        b.iter(|| {
            let summary = summarize(black_box(&sim_rows), black_box(&params));
            black_box(summary.total_bets);
        })
    });
}

fn bench_parse_history(c: &mut Criterion) {
    let (rows, _) = season_rows(170);
    let payload = json!({ "tables": { "PredictionsHistory": rows } }).to_string();
    c.bench_function("parse_history_json", |b| {
        b.iter(|| {
            let parsed = dataset::parse_history_json(black_box(&payload)).unwrap();
            black_box(parsed.len());
        })
    });
}

criterion_group!(
    benches,
    bench_simulate_season,
    bench_summarize,
    bench_parse_history
);
criterion_main!(benches);
