use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde_json::Value;

use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;
use crate::record::{
    self, AWAY_ODDS_ALIASES, HOME_ODDS_ALIASES, PREDICTION_ALIASES, RawRow, STRENGTH_ALIASES,
};
use crate::simulate::SimParams;

pub const PREFERRED_MAIN_TABLES: &[&str] = &[
    "PredictionsHistory",
    "Main",
    "History",
    "Games",
    "Performance",
    "performance",
];
pub const PREFERRED_TODAY_TABLES: &[&str] = &["TodayRecommendations", "Today", "DayOf", "Predictions"];

// Day-of rows carry a single consensus line rather than per-side odds, but
// older exports used the per-side spellings, so those are accepted too.
const TODAY_ODDS_ALIASES: &[&str] = &["Money Line", "ml", "moneyline", "best_ml", "consensus_ml"];

/// One published prediction dataset: the live tracking window or an archived
/// season. Each carries a hard season start so early-season noise stays out
/// of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Live,
    Season2024,
    Season2023,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Live, Dataset::Season2024, Dataset::Season2023];

    pub fn from_arg(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "live" | "current" => Some(Dataset::Live),
            "2024" => Some(Dataset::Season2024),
            "2023" => Some(Dataset::Season2023),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Dataset::Live => "live",
            Dataset::Season2024 => "2024",
            Dataset::Season2023 => "2023",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dataset::Live => "Live (Current)",
            Dataset::Season2024 => "2024 Database",
            Dataset::Season2023 => "2023 Database",
        }
    }

    pub fn history_path(self) -> &'static str {
        match self {
            Dataset::Live => "data/database.json",
            Dataset::Season2024 => "data/2024Database.json",
            Dataset::Season2023 => "data/2023Database.json",
        }
    }

    /// Day-of recommendations are only built for the live window.
    pub fn day_of_path(self) -> Option<&'static str> {
        match self {
            Dataset::Live => Some("data/dayOf.json"),
            _ => None,
        }
    }

    pub fn season_start(self) -> NaiveDate {
        let (y, m, d) = match self {
            Dataset::Live => (2025, 11, 21),
            Dataset::Season2024 => (2024, 11, 22),
            Dataset::Season2023 => (2023, 11, 24),
        };
        NaiveDate::from_ymd_opt(y, m, d).expect("valid season start date")
    }

    pub fn default_params(self) -> SimParams {
        SimParams::new(self.season_start())
    }

    pub fn is_archive(self) -> bool {
        !matches!(self, Dataset::Live)
    }
}

/// Base URL the dataset JSON is served from, e.g.
/// `BETSIM_DATA_URL=https://example.com/algo/`.
pub fn data_base_url() -> Result<String> {
    let raw = std::env::var("BETSIM_DATA_URL").context("BETSIM_DATA_URL is not set")?;
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(anyhow!("BETSIM_DATA_URL is empty"));
    }
    Ok(trimmed.to_string())
}

pub fn fetch_history(dataset: Dataset) -> Result<Vec<RawRow>> {
    let base = data_base_url()?;
    let url = format!("{base}/{}", dataset.history_path());
    let body = fetch_json_cached(http_client()?, &url)
        .with_context(|| format!("fetch history failed ({})", dataset.label()))?;
    parse_history_json(&body)
}

pub fn fetch_day_of(dataset: Dataset) -> Result<Vec<RawRow>> {
    let Some(path) = dataset.day_of_path() else {
        return Ok(Vec::new());
    };
    let base = data_base_url()?;
    let url = format!("{base}/{path}");
    let body = fetch_json_cached(http_client()?, &url)
        .with_context(|| format!("fetch day-of failed ({})", dataset.label()))?;
    parse_day_of_json(&body)
}

pub fn parse_history_json(raw: &str) -> Result<Vec<RawRow>> {
    let value = serde_json::from_str::<Value>(raw.trim()).context("invalid history json")?;
    Ok(record::pick_rows(&value, PREFERRED_MAIN_TABLES))
}

pub fn parse_day_of_json(raw: &str) -> Result<Vec<RawRow>> {
    let value = serde_json::from_str::<Value>(raw.trim()).context("invalid day-of json")?;
    Ok(record::pick_rows(&value, PREFERRED_TODAY_TABLES))
}

/// A day-of recommendation: same record shape as history minus outcome
/// fields, since the games are unplayed.
#[derive(Debug, Clone, PartialEq)]
pub struct Favourite {
    pub matchup: String,
    pub prediction: String,
    pub strength: Option<f64>,
    pub moneyline: Option<f64>,
}

pub fn favourites(rows: &[RawRow]) -> Vec<Favourite> {
    rows.iter()
        .map(|row| Favourite {
            matchup: record::matchup(row),
            prediction: record::string_field(row, PREDICTION_ALIASES).unwrap_or_default(),
            strength: record::number_field(row, STRENGTH_ALIASES),
            moneyline: day_of_moneyline(row),
        })
        .collect()
}

fn day_of_moneyline(row: &RawRow) -> Option<f64> {
    record::number_field(row, TODAY_ODDS_ALIASES)
        .or_else(|| record::number_field(row, HOME_ODDS_ALIASES))
        .or_else(|| record::number_field(row, AWAY_ODDS_ALIASES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_arg_parsing() {
        assert_eq!(Dataset::from_arg("live"), Some(Dataset::Live));
        assert_eq!(Dataset::from_arg(" 2024 "), Some(Dataset::Season2024));
        assert_eq!(Dataset::from_arg("1999"), None);
    }

    #[test]
    fn season_starts_match_published_windows() {
        assert_eq!(
            Dataset::Season2023.season_start(),
            NaiveDate::from_ymd_opt(2023, 11, 24).unwrap()
        );
        assert!(Dataset::Season2024.is_archive());
        assert!(!Dataset::Live.is_archive());
        assert_eq!(Dataset::Season2024.day_of_path(), None);
    }
}
