use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;

/// A raw prediction row as published by the model pipeline. Field names vary
/// by dataset vintage ("Game Date" vs "game_date" vs "gameDate"), so lookups
/// go through the alias tables below instead of fixed struct fields.
pub type RawRow = serde_json::Map<String, Value>;

pub const DATE_ALIASES: &[&str] = &["Game Date", "date", "game_date", "gameDate"];
pub const HOME_ALIASES: &[&str] = &[
    "Home Team",
    "home",
    "home_team",
    "homeTeam",
    "teamOne",
    "home_name",
];
pub const AWAY_ALIASES: &[&str] = &[
    "Visitor Team",
    "away",
    "away_team",
    "visitor",
    "visitor_team",
    "awayTeam",
    "teamTwo",
    "away_name",
];
pub const PREDICTION_ALIASES: &[&str] = &[
    "Prediction",
    "prediction",
    "pick",
    "predicted_winner",
    "model_pick",
];
pub const STRENGTH_ALIASES: &[&str] = &[
    "Prediction Strength",
    "prediction_strength",
    "edge",
    "confidence",
    "model_confidence",
    "predictionStrength",
];
pub const WINNER_ALIASES: &[&str] = &["Winner", "winner", "winning_team", "winnerTeam"];
// 1 = win, 0 = loss, anything else (-1) = unknown.
pub const CORRECTNESS_CODE_ALIASES: &[&str] = &["predictionCorrectness"];
pub const HOME_ODDS_ALIASES: &[&str] = &[
    "Home ML",
    "home_ml",
    "homeMoneyline",
    "teamOne_ml",
    "home_odds",
    "homeMoneyLine",
    "homeML",
];
pub const AWAY_ODDS_ALIASES: &[&str] = &[
    "Away ML",
    "away_ml",
    "awayMoneyline",
    "visitor_ml",
    "teamTwo_ml",
    "away_odds",
    "awayMoneyLine",
    "awayML",
];
pub const PREDICTED_ODDS_ALIASES: &[&str] = &[
    "Pred ML",
    "pred_ml",
    "model_ml",
    "model_moneyline",
    "decimal_odds",
    "ml",
    "moneyline",
];
pub const MATCHUP_ALIASES: &[&str] = &["Matchup", "matchup", "game", "teams"];

const HOME_MARKERS: &[&str] = &["home", "h", "1"];
const AWAY_MARKERS: &[&str] = &["away", "a", "2"];

/// Tri-state outcome of a prediction once the game has (or has not) settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correctness {
    Won,
    Lost,
    Unknown,
}

impl Correctness {
    pub fn is_known(self) -> bool {
        !matches!(self, Correctness::Unknown)
    }
}

/// Canonical key form: lowercased with spaces, underscores, and hyphens
/// stripped, so "Game Date", "game_date", and "gameDate" all collide.
pub fn norm_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// First alias present on the row wins; alias order is significant so exact
/// preferred spellings take precedence over looser fallbacks.
pub fn field<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a Value> {
    let keys: HashMap<String, &String> = row.keys().map(|k| (norm_key(k), k)).collect();
    for alias in aliases {
        if let Some(key) = keys.get(&norm_key(alias)) {
            return row.get(*key);
        }
    }
    None
}

pub fn string_field(row: &RawRow, aliases: &[&str]) -> Option<String> {
    let value = field(row, aliases)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

/// Numeric fields arrive as JSON numbers or as strings depending on vintage;
/// anything unparsable is treated as absent, never as an error.
pub fn number_field(row: &RawRow, aliases: &[&str]) -> Option<f64> {
    as_f64_any(field(row, aliases)?)
}

pub fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return n.is_finite().then_some(n);
    }
    let n = v.as_str()?.trim().parse::<f64>().ok()?;
    n.is_finite().then_some(n)
}

/// Day-granularity date key. Timestamps are truncated to their leading
/// `YYYY-MM-DD` so rows group by calendar day.
pub fn date_field(row: &RawRow, aliases: &[&str]) -> Option<NaiveDate> {
    let raw = string_field(row, aliases)?;
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Resolve the decimal odds for the side the model picked.
///
/// Matching order: prediction equals the home team name (or a home-side
/// marker) -> home odds; away name/marker -> away odds; explicit
/// predicted-odds column; finally whichever side has the smaller absolute
/// odds, since some historical rows never map the pick to a side.
pub fn predicted_odds(row: &RawRow) -> Option<f64> {
    let prediction = string_field(row, PREDICTION_ALIASES);
    let home = string_field(row, HOME_ALIASES);
    let away = string_field(row, AWAY_ALIASES);
    let home_odds = number_field(row, HOME_ODDS_ALIASES);
    let away_odds = number_field(row, AWAY_ODDS_ALIASES);

    if let Some(pick) = prediction.as_deref() {
        let pick = norm_key(pick);
        let matches_home = home.as_deref().is_some_and(|h| norm_key(h) == pick)
            || HOME_MARKERS.contains(&pick.as_str());
        if matches_home && home_odds.is_some() {
            return home_odds;
        }
        let matches_away = away.as_deref().is_some_and(|a| norm_key(a) == pick)
            || AWAY_MARKERS.contains(&pick.as_str());
        if matches_away && away_odds.is_some() {
            return away_odds;
        }
    }

    if let Some(explicit) = number_field(row, PREDICTED_ODDS_ALIASES) {
        return Some(explicit);
    }
    match (home_odds, away_odds) {
        (Some(h), Some(a)) => Some(if h.abs() <= a.abs() { h } else { a }),
        _ => None,
    }
}

/// Determine whether the prediction was right. An explicit numeric
/// correctness code wins when present; otherwise the pick is compared to an
/// explicit winner column, format-insensitively.
pub fn correctness(row: &RawRow) -> Correctness {
    if let Some(code) = number_field(row, CORRECTNESS_CODE_ALIASES) {
        if code == 1.0 {
            return Correctness::Won;
        }
        if code == 0.0 {
            return Correctness::Lost;
        }
        return Correctness::Unknown;
    }

    let (Some(pick), Some(winner)) = (
        string_field(row, PREDICTION_ALIASES),
        string_field(row, WINNER_ALIASES),
    ) else {
        return Correctness::Unknown;
    };
    if norm_key(&pick) == norm_key(&winner) {
        Correctness::Won
    } else {
        Correctness::Lost
    }
}

/// "Away @ Home" label for day-of rows, preferring an explicit matchup column.
pub fn matchup(row: &RawRow) -> String {
    if let Some(explicit) = string_field(row, MATCHUP_ALIASES) {
        return explicit;
    }
    let home = string_field(row, HOME_ALIASES);
    let away = string_field(row, AWAY_ALIASES);
    if home.is_none() && away.is_none() {
        return String::new();
    }
    format!(
        "{} @ {}",
        away.unwrap_or_else(|| "Away".to_string()),
        home.unwrap_or_else(|| "Home".to_string())
    )
}

/// Pull the row array out of a payload that may be a bare array,
/// `{ "rows": [...] }`, or `{ "tables": { name: [...] } }`. Preferred table
/// names are tried in order, then the first non-empty table wins.
pub fn pick_rows(json: &Value, preferred_tables: &[&str]) -> Vec<RawRow> {
    if let Some(rows) = json.as_array() {
        return collect_rows(rows);
    }
    if let Some(rows) = json.get("rows").and_then(|v| v.as_array()) {
        return collect_rows(rows);
    }
    let Some(tables) = json.get("tables").and_then(|v| v.as_object()) else {
        return Vec::new();
    };
    for name in preferred_tables {
        if let Some(rows) = tables.get(*name).and_then(|v| v.as_array())
            && !rows.is_empty()
        {
            return collect_rows(rows);
        }
    }
    for rows in tables.values() {
        if let Some(rows) = rows.as_array()
            && !rows.is_empty()
        {
            return collect_rows(rows);
        }
    }
    Vec::new()
}

fn collect_rows(rows: &[Value]) -> Vec<RawRow> {
    rows.iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> RawRow {
        v.as_object().cloned().expect("object literal")
    }

    #[test]
    fn norm_key_collapses_spellings() {
        assert_eq!(norm_key("Game Date"), "gamedate");
        assert_eq!(norm_key("game_date"), "gamedate");
        assert_eq!(norm_key("Home-ML"), "homeml");
    }

    #[test]
    fn alias_order_prefers_exact_names() {
        let r = row(json!({"confidence": 55, "Prediction Strength": 81}));
        assert_eq!(number_field(&r, STRENGTH_ALIASES), Some(81.0));
    }

    #[test]
    fn predicted_odds_follows_pick_side() {
        let r = row(json!({
            "Home Team": "Celtics",
            "Visitor Team": "Lakers",
            "Prediction": "celtics",
            "Home ML": 1.55,
            "Away ML": 2.40,
        }));
        assert_eq!(predicted_odds(&r), Some(1.55));
    }

    #[test]
    fn predicted_odds_side_markers() {
        let r = row(json!({
            "home": "NYK", "away": "BOS",
            "prediction": "away",
            "home_ml": "1.9", "away_ml": "2.1",
        }));
        assert_eq!(predicted_odds(&r), Some(2.1));
    }

    #[test]
    fn predicted_odds_falls_back_to_shorter_price() {
        let r = row(json!({
            "prediction": "Knicks",
            "home_team": "Celtics",
            "away_team": "Lakers",
            "home_ml": 2.6,
            "away_ml": 1.48,
        }));
        assert_eq!(predicted_odds(&r), Some(1.48));
    }

    #[test]
    fn predicted_odds_missing_everything_is_none() {
        let r = row(json!({"prediction": "Celtics"}));
        assert_eq!(predicted_odds(&r), None);
    }

    #[test]
    fn correctness_code_beats_winner_column() {
        let r = row(json!({
            "prediction": "Celtics",
            "winner": "Celtics",
            "predictionCorrectness": 0,
        }));
        assert_eq!(correctness(&r), Correctness::Lost);
    }

    #[test]
    fn correctness_sentinel_is_unknown() {
        let r = row(json!({"predictionCorrectness": -1}));
        assert_eq!(correctness(&r), Correctness::Unknown);
    }

    #[test]
    fn correctness_compares_names_loosely() {
        let r = row(json!({"prediction": "New York", "Winner": "new_york"}));
        assert_eq!(correctness(&r), Correctness::Won);
    }

    #[test]
    fn malformed_numbers_degrade_to_none() {
        let r = row(json!({"home_ml": "n/a", "away_ml": {}}));
        assert_eq!(number_field(&r, HOME_ODDS_ALIASES), None);
        assert_eq!(number_field(&r, AWAY_ODDS_ALIASES), None);
    }

    #[test]
    fn date_field_truncates_timestamps() {
        let r = row(json!({"gameDate": "2024-11-22T19:30:00Z"}));
        assert_eq!(
            date_field(&r, DATE_ALIASES),
            NaiveDate::from_ymd_opt(2024, 11, 22)
        );
    }

    #[test]
    fn pick_rows_handles_all_shapes() {
        let bare = json!([{"a": 1}]);
        assert_eq!(pick_rows(&bare, &[]).len(), 1);

        let wrapped = json!({"rows": [{"a": 1}, {"b": 2}]});
        assert_eq!(pick_rows(&wrapped, &[]).len(), 2);

        let tables = json!({"tables": {
            "ignored": [],
            "performance": [{"a": 1}],
            "other": [{"b": 2}, {"c": 3}],
        }});
        let rows = pick_rows(&tables, &["performance"]);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains_key("a"));
    }
}
