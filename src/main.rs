use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

use betsim_terminal::dataset::{self, Dataset};
use betsim_terminal::export;
use betsim_terminal::fake_feed;
use betsim_terminal::record::RawRow;
use betsim_terminal::sim_cache::{self, CachedRun, FileSimCache, SimCache};
use betsim_terminal::simulate::{self, SimRow};
use betsim_terminal::stats::{self, Summary};

const DEFAULT_FAKE_DAYS: usize = 45;
const DEFAULT_FAKE_SEED: u64 = 17;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let dataset = match parse_str_arg("--dataset") {
        Some(raw) => Dataset::from_arg(&raw)
            .ok_or_else(|| anyhow!("unknown dataset {raw:?} (expected live, 2024, or 2023)"))?,
        None => Dataset::Live,
    };
    let fake = has_flag("--fake");
    let local_history = parse_path_arg("--main-json");
    let no_cache = has_flag("--no-cache");
    let export_path = parse_path_arg("--export");

    let mut params = dataset.default_params();
    if let Some(v) = parse_f64_arg("--bankroll") {
        params.starting_bankroll = v;
    }
    if let Some(v) = parse_f64_arg("--strength") {
        params.strength_threshold = v;
    }
    if let Some(v) = parse_f64_arg("--stake-percent") {
        params.daily_stake_percent = v;
    }
    if let Some(raw) = parse_str_arg("--max-odds") {
        params.max_odds = if raw.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(raw.trim().parse::<f64>().context("invalid --max-odds")?)
        };
    }
    if let Some(raw) = parse_str_arg("--start") {
        params.season_start = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .context("invalid --start, expected YYYY-MM-DD")?;
    }
    if let Some(v) = parse_f64_arg("--reset-bankroll") {
        params.reset_bankroll = v;
    }
    if let Some(v) = parse_f64_arg("--reinvest") {
        params.reinvestment_threshold = v;
    }
    params.validate()?;

    let history = load_history(dataset, fake, local_history.as_deref())?;

    // Archive datasets never change, so their runs are served from the
    // result cache; the live window always recomputes.
    let cacheable = dataset.is_archive() && !fake && local_history.is_none() && !no_cache;
    let cache = if cacheable {
        FileSimCache::in_app_cache()
    } else {
        None
    };
    let key = sim_cache::cache_key(dataset.id(), &params);

    let (rows, summary, from_cache) = match cache.as_ref().and_then(|c| c.get(&key)) {
        Some(run) => (run.rows, run.summary, true),
        None => {
            let rows = simulate::simulate(&history, &params)?;
            let summary = stats::summarize(&rows, &params);
            if let Some(cache) = cache.as_ref() {
                cache.put(
                    &key,
                    CachedRun {
                        rows: rows.clone(),
                        summary: summary.clone(),
                        saved_at: sim_cache::now_secs(),
                    },
                );
            }
            (rows, summary, false)
        }
    };

    println!(
        "Dataset: {}{}",
        dataset.label(),
        if from_cache { " (cached)" } else { "" }
    );
    println!(
        "Policy: start {} | bankroll {:.2} | strength >= {} | stake {}%/day | odds cap {}",
        params.season_start,
        params.starting_bankroll,
        params.strength_threshold,
        params.daily_stake_percent,
        params
            .max_odds
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "none".to_string()),
    );
    println!();

    print_rows(&rows);
    println!();
    print_summary(&summary);

    if dataset == Dataset::Live || fake {
        println!();
        print_favourites(dataset, fake)?;
    }

    if let Some(path) = export_path {
        export::export_simulation(&path, &rows, &summary)?;
        println!();
        println!("Exported workbook to {}", path.display());
    }

    Ok(())
}

fn load_history(dataset: Dataset, fake: bool, local: Option<&std::path::Path>) -> Result<Vec<RawRow>> {
    if fake {
        let days = parse_usize_arg("--days").unwrap_or(DEFAULT_FAKE_DAYS).max(1);
        let seed = parse_u64_arg("--seed").unwrap_or(DEFAULT_FAKE_SEED);
        let mut rng = fake_feed::seeded_rng(seed);
        return Ok(fake_feed::generate_history(
            &mut rng,
            dataset.season_start(),
            days,
        ));
    }
    if let Some(path) = local {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read history file {}", path.display()))?;
        return dataset::parse_history_json(&raw);
    }
    dataset::fetch_history(dataset)
}

fn print_rows(rows: &[SimRow]) {
    if rows.is_empty() {
        println!("No rows available after filters.");
        return;
    }
    println!(
        "{:<10} {:<15} {:<15} {:<15} {:>4} {:>7} {:>2} {:>6} {:>10} {:>10} {:>12}",
        "Date", "Home", "Visitor", "Pick", "Str", "PredML", "C", "Win%", "Stake", "Result", "Bankroll"
    );
    for row in rows {
        let correct = match row.correct {
            Some(true) => "W",
            Some(false) => "L",
            None => "-",
        };
        println!(
            "{:<10} {:<15} {:<15} {:<15} {:>4.0} {:>7} {:>2} {:>6} {:>10} {:>10} {:>12.2}{}",
            row.date,
            truncate(&row.home, 15),
            truncate(&row.away, 15),
            truncate(&row.prediction, 15),
            row.strength,
            row.predicted_odds
                .map(|o| format!("{o:.2}"))
                .unwrap_or_default(),
            correct,
            row.return_percent
                .map(|p| format!("{p}%"))
                .unwrap_or_default(),
            row.stake.map(|s| format!("{s:.2}")).unwrap_or_default(),
            row.result.map(signed_money).unwrap_or_default(),
            row.bankroll_after,
            if row.bankroll_reset { "  [reset]" } else { "" },
        );
    }
}

fn print_summary(summary: &Summary) {
    println!("Overall results:");
    println!("  Total bets:     {}", summary.total_bets);
    println!("  W / L:          {} / {}", summary.wins, summary.losses);
    println!("  Win rate:       {}%", summary.win_rate_percent);
    println!("  Total P&L:      {}", signed_money(summary.total_pnl));
    println!("  Final bankroll: {:.2}", summary.final_bankroll);
    println!("  Avg ROI / bet:  {}%", summary.average_return_percent);
    match summary.peak_bankroll_date {
        Some(date) => println!(
            "  Max bankroll:   {:.2} (on {date})",
            summary.peak_bankroll
        ),
        None => println!("  Max bankroll:   {:.2}", summary.peak_bankroll),
    }
}

fn print_favourites(dataset: Dataset, fake: bool) -> Result<()> {
    let rows = if fake {
        let seed = parse_u64_arg("--seed").unwrap_or(DEFAULT_FAKE_SEED);
        let mut rng = fake_feed::seeded_rng(seed.wrapping_add(1));
        fake_feed::generate_day_of(&mut rng, dataset.season_start())
    } else {
        match dataset::fetch_day_of(dataset) {
            Ok(rows) => rows,
            Err(err) => {
                println!("Favourites today: unavailable ({err})");
                return Ok(());
            }
        }
    };

    let favourites = dataset::favourites(&rows);
    println!("Favourites today:");
    if favourites.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for fav in favourites {
        println!(
            "  {:<35} pick {:<15} strength {:>4} ml {}",
            truncate(&fav.matchup, 35),
            truncate(&fav.prediction, 15),
            fav.strength
                .map(|s| format!("{s:.0}"))
                .unwrap_or_else(|| "-".to_string()),
            fav.moneyline
                .map(|m| format!("{m:.2}"))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

fn signed_money(v: f64) -> String {
    if v >= 0.0 {
        format!("+{v:.2}")
    } else {
        format!("-{:.2}", v.abs())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).collect::<String>() + "…"
    }
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

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_str_arg(name).map(PathBuf::from)
}

fn parse_f64_arg(name: &str) -> Option<f64> {
    parse_str_arg(name).and_then(|raw| raw.parse::<f64>().ok())
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
