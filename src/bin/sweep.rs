use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;

use betsim_terminal::dataset::{self, Dataset};
use betsim_terminal::fake_feed;
use betsim_terminal::record::RawRow;
use betsim_terminal::simulate::{self, SimParams};
use betsim_terminal::stats::{self, Summary};

const DEFAULT_STRENGTHS: [f64; 4] = [60.0, 65.0, 70.0, 75.0];
const DEFAULT_STAKE_PERCENTS: [f64; 4] = [10.0, 20.0, 30.0, 40.0];
const DEFAULT_ODDS_CAPS: [f64; 3] = [1.8, 2.0, 2.5];
const DEFAULT_TOP: usize = 15;
const DEFAULT_FAKE_DAYS: usize = 45;
const DEFAULT_FAKE_SEED: u64 = 17;

#[derive(Debug, Clone)]
struct GridReport {
    params: SimParams,
    summary: Summary,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let dataset = match parse_str_arg("--dataset") {
        Some(raw) => Dataset::from_arg(&raw)
            .ok_or_else(|| anyhow!("unknown dataset {raw:?} (expected live, 2024, or 2023)"))?,
        None => Dataset::Season2024,
    };

    let strengths = parse_f64_list_arg("--strengths")
        .unwrap_or_else(|| DEFAULT_STRENGTHS.to_vec())
        .into_iter()
        .map(|v| v.clamp(0.0, 100.0))
        .collect::<Vec<_>>();
    let stake_percents = parse_f64_list_arg("--stake-percents")
        .unwrap_or_else(|| DEFAULT_STAKE_PERCENTS.to_vec())
        .into_iter()
        .map(|v| v.clamp(0.0, 100.0))
        .collect::<Vec<_>>();
    let mut odds_caps: Vec<Option<f64>> = parse_f64_list_arg("--odds-caps")
        .unwrap_or_else(|| DEFAULT_ODDS_CAPS.to_vec())
        .into_iter()
        .map(Some)
        .collect();
    if has_flag("--uncapped") {
        odds_caps.push(None);
    }
    let top = parse_usize_arg("--top").unwrap_or(DEFAULT_TOP).clamp(1, 500);

    let history = load_history(dataset)?;
    if history.is_empty() {
        return Err(anyhow!("no history rows for {}", dataset.label()));
    }

    let mut grid = Vec::new();
    for strength in &strengths {
        for stake in &stake_percents {
            for cap in &odds_caps {
                let mut params = dataset.default_params();
                params.strength_threshold = *strength;
                params.daily_stake_percent = *stake;
                params.max_odds = *cap;
                grid.push(params);
            }
        }
    }

    let mut reports = grid
        .into_par_iter()
        .map(|params| -> Result<GridReport> {
            let rows = simulate::simulate(&history, &params)?;
            let summary = stats::summarize(&rows, &params);
            Ok(GridReport { params, summary })
        })
        .collect::<Result<Vec<_>>>()?;

    reports.sort_by(compare_reports);

    println!("Parameter sweep: {}", dataset.label());
    println!(
        "History rows: {} | combos: {} (top {})",
        history.len(),
        reports.len(),
        top.min(reports.len())
    );
    println!();
    println!(
        "{:>4} {:>6} {:>5} {:>5} {:>5} {:>5} {:>12} {:>10} {:>6}",
        "str", "stake%", "cap", "bets", "wins", "win%", "final", "pnl", "roi%"
    );
    for report in reports.iter().take(top) {
        let s = &report.summary;
        println!(
            "{:>4.0} {:>6.0} {:>5} {:>5} {:>5} {:>4}% {:>12.2} {:>10.2} {:>5}%",
            report.params.strength_threshold,
            report.params.daily_stake_percent,
            report
                .params
                .max_odds
                .map(|c| format!("{c:.1}"))
                .unwrap_or_else(|| "-".to_string()),
            s.total_bets,
            s.wins,
            s.win_rate_percent,
            s.final_bankroll,
            s.total_pnl,
            s.average_return_percent,
        );
    }

    Ok(())
}

fn compare_reports(a: &GridReport, b: &GridReport) -> Ordering {
    b.summary
        .final_bankroll
        .partial_cmp(&a.summary.final_bankroll)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.summary
                .win_rate_percent
                .cmp(&a.summary.win_rate_percent)
        })
        .then_with(|| b.summary.total_bets.cmp(&a.summary.total_bets))
}

fn load_history(dataset: Dataset) -> Result<Vec<RawRow>> {
    if has_flag("--fake") {
        let days = parse_usize_arg("--days").unwrap_or(DEFAULT_FAKE_DAYS).max(1);
        let seed = parse_u64_arg("--seed").unwrap_or(DEFAULT_FAKE_SEED);
        let mut rng = fake_feed::seeded_rng(seed);
        return Ok(fake_feed::generate_history(
            &mut rng,
            dataset.season_start(),
            days,
        ));
    }
    if let Some(path) = parse_str_arg("--main-json").map(PathBuf::from) {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read history file {}", path.display()))?;
        return dataset::parse_history_json(&raw);
    }
    dataset::fetch_history(dataset)
}

fn parse_str_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_f64_list_arg(name: &str) -> Option<Vec<f64>> {
    let raw = parse_str_arg(name)?;
    let mut out = Vec::new();
    for part in raw.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            out.push(v);
        }
    }
    if out.is_empty() { None } else { Some(out) }
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    parse_str_arg(name).and_then(|raw| raw.parse::<usize>().ok())
}

fn parse_u64_arg(name: &str) -> Option<u64> {
    parse_str_arg(name).and_then(|raw| raw.parse::<u64>().ok())
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
