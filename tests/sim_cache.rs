use std::path::PathBuf;

use chrono::NaiveDate;
use serde_json::json;

use betsim_terminal::sim_cache::{self, CachedRun, FileSimCache, SimCache};
use betsim_terminal::simulate::{SimParams, simulate};
use betsim_terminal::stats::summarize;

fn temp_cache_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "betsim-test-{tag}-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn sample_run(params: &SimParams) -> CachedRun {
    let rows = vec![json!({
        "Game Date": "2024-11-23",
        "Home Team": "Celtics",
        "Visitor Team": "Lakers",
        "Prediction": "Celtics",
        "Prediction Strength": 88,
        "Home ML": 1.8,
        "Away ML": 2.4,
        "predictionCorrectness": 1,
    })
    .as_object()
    .cloned()
    .unwrap()];
    let sim_rows = simulate(&rows, params).unwrap();
    let summary = summarize(&sim_rows, params);
    CachedRun {
        rows: sim_rows,
        summary,
        saved_at: sim_cache::now_secs(),
    }
}

#[test]
fn roundtrip_through_the_file_cache() {
    let dir = temp_cache_dir("roundtrip");
    let cache = FileSimCache::new(dir.clone());

    let params = SimParams::new(NaiveDate::from_ymd_opt(2024, 11, 22).unwrap());
    let key = sim_cache::cache_key("2024", &params);
    assert!(cache.get(&key).is_none());

    let run = sample_run(&params);
    cache.put(&key, run.clone());

    let loaded = cache.get(&key).expect("cached run present");
    assert_eq!(loaded.rows, run.rows);
    assert_eq!(loaded.summary, run.summary);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn changed_parameters_miss_the_cache() {
    let dir = temp_cache_dir("invalidate");
    let cache = FileSimCache::new(dir.clone());

    let params = SimParams::new(NaiveDate::from_ymd_opt(2024, 11, 22).unwrap());
    cache.put(&sim_cache::cache_key("2024", &params), sample_run(&params));

    // Any policy change must produce a different key, not a stale hit.
    let mut tweaked = params.clone();
    tweaked.strength_threshold = 75.0;
    assert!(cache.get(&sim_cache::cache_key("2024", &tweaked)).is_none());

    let mut restaked = params.clone();
    restaked.daily_stake_percent = 25.0;
    assert!(cache.get(&sim_cache::cache_key("2024", &restaked)).is_none());

    // Same dataset, different season window.
    let mut shifted = params;
    shifted.season_start = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
    assert!(cache.get(&sim_cache::cache_key("2024", &shifted)).is_none());

    let _ = std::fs::remove_dir_all(&dir);
}
