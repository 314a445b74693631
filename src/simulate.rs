use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::{
    self, AWAY_ODDS_ALIASES, AWAY_ALIASES, Correctness, DATE_ALIASES, HOME_ODDS_ALIASES,
    HOME_ALIASES, PREDICTION_ALIASES, RawRow, STRENGTH_ALIASES,
};

pub const DEFAULT_STARTING_BANKROLL: f64 = 3000.0;
pub const DEFAULT_STRENGTH_THRESHOLD: f64 = 70.0;
pub const DEFAULT_MAX_ODDS: f64 = 2.0;
pub const DEFAULT_DAILY_STAKE_PERCENT: f64 = 40.0;
pub const DEFAULT_RESET_BANKROLL: f64 = 500.0;

/// Staking policy for one simulation run. Immutable once built; any change
/// produces a different cache fingerprint (see `sim_cache`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    pub starting_bankroll: f64,
    /// Minimum prediction strength for a row to qualify for a bet.
    pub strength_threshold: f64,
    /// Cap on the predicted side's decimal odds; rows above it (or with
    /// unresolvable odds while a cap is set) are dropped entirely.
    pub max_odds: Option<f64>,
    /// Percent of the day-opening bankroll wagered on every bet that day.
    pub daily_stake_percent: f64,
    /// Rows dated before this are excluded, aligning the run to a season.
    pub season_start: NaiveDate,
    /// Cumulative cap on losses diverted back into the bankroll.
    /// 0 disables the pool, which is the shipped default.
    pub reinvestment_threshold: f64,
    /// Floor the bankroll is restored to once it reaches zero or below.
    pub reset_bankroll: f64,
}

impl SimParams {
    pub fn new(season_start: NaiveDate) -> Self {
        Self {
            starting_bankroll: DEFAULT_STARTING_BANKROLL,
            strength_threshold: DEFAULT_STRENGTH_THRESHOLD,
            max_odds: Some(DEFAULT_MAX_ODDS),
            daily_stake_percent: DEFAULT_DAILY_STAKE_PERCENT,
            season_start,
            reinvestment_threshold: 0.0,
            reset_bankroll: DEFAULT_RESET_BANKROLL,
        }
    }

    /// Structural validation. Data-quality problems never error, but a
    /// nonsensical parameter set is a caller bug and is rejected up front.
    pub fn validate(&self) -> Result<()> {
        if !(self.starting_bankroll > 0.0) {
            return Err(anyhow!(
                "starting_bankroll must be positive, got {}",
                self.starting_bankroll
            ));
        }
        if !(0.0..=100.0).contains(&self.daily_stake_percent) {
            return Err(anyhow!(
                "daily_stake_percent must be within 0..=100, got {}",
                self.daily_stake_percent
            ));
        }
        if let Some(cap) = self.max_odds
            && !(cap > 1.0)
        {
            return Err(anyhow!("max_odds must exceed 1.0, got {cap}"));
        }
        if !(self.reset_bankroll >= 0.0) {
            return Err(anyhow!(
                "reset_bankroll must be non-negative, got {}",
                self.reset_bankroll
            ));
        }
        if !(self.reinvestment_threshold >= 0.0) {
            return Err(anyhow!(
                "reinvestment_threshold must be non-negative, got {}",
                self.reinvestment_threshold
            ));
        }
        Ok(())
    }
}

/// One simulated bet (or unstaked pass-through row). Never mutated after the
/// fold emits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimRow {
    pub date: NaiveDate,
    pub home: String,
    pub away: String,
    pub prediction: String,
    pub strength: f64,
    pub home_odds: Option<f64>,
    pub away_odds: Option<f64>,
    pub predicted_odds: Option<f64>,
    /// None means the outcome is unknown and the row was not staked.
    pub correct: Option<bool>,
    pub stake: Option<f64>,
    /// Profit when positive, lost stake when negative.
    pub result: Option<f64>,
    /// Per-bet return in whole percent: (odds - 1) * 100 on a win, -100 on a loss.
    pub return_percent: Option<i64>,
    pub reinvested: f64,
    pub bankroll_after: f64,
    pub bankroll_reset: bool,
}

impl SimRow {
    pub fn is_settled(&self) -> bool {
        self.result.is_some()
    }
}

struct QualifiedRow {
    date: NaiveDate,
    home: String,
    away: String,
    prediction: String,
    strength: f64,
    home_odds: Option<f64>,
    away_odds: Option<f64>,
    predicted_odds: Option<f64>,
    correctness: Correctness,
}

/// Replay the staking policy over raw prediction rows.
///
/// Rows below the strength threshold, before the season start, or over the
/// odds cap are dropped. Surviving rows are ordered by date ascending and
/// strength descending, then folded: every bet on a calendar day stakes the
/// same amount, computed once from that day's opening bankroll, so intra-day
/// results never change the day's stake. Unknown-outcome rows pass through
/// unstaked with the bankroll untouched.
///
/// Errors only on an invalid parameter set, never on data quality.
pub fn simulate(rows: &[RawRow], params: &SimParams) -> Result<Vec<SimRow>> {
    params.validate()?;

    let mut qualified: Vec<QualifiedRow> = rows.iter().filter_map(|r| qualify(r, params)).collect();
    qualified.sort_by(|a, b| {
        a.date.cmp(&b.date).then_with(|| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });

    let stake_fraction = params.daily_stake_percent / 100.0;
    let mut bankroll = params.starting_bankroll;
    let mut current_date: Option<NaiveDate> = None;
    let mut per_bet_stake = 0.0;
    let mut total_reinvested = 0.0;

    let mut out = Vec::with_capacity(qualified.len());
    for row in qualified.drain(..) {
        if current_date != Some(row.date) {
            current_date = Some(row.date);
            per_bet_stake = round2(bankroll * stake_fraction);
        }

        let mut bankroll_reset = false;
        if bankroll <= 0.0 {
            bankroll = params.reset_bankroll;
            bankroll_reset = true;
            per_bet_stake = round2(bankroll * stake_fraction);
        }

        let (correct, odds) = match (row.correctness, row.predicted_odds) {
            (Correctness::Won, Some(odds)) => (true, odds),
            (Correctness::Lost, Some(odds)) => (false, odds),
            // Unknown outcome or unresolved odds: keep the row, skip the bet.
            _ => {
                out.push(SimRow {
                    date: row.date,
                    home: row.home,
                    away: row.away,
                    prediction: row.prediction,
                    strength: row.strength,
                    home_odds: row.home_odds,
                    away_odds: row.away_odds,
                    predicted_odds: row.predicted_odds,
                    correct: None,
                    stake: None,
                    result: None,
                    return_percent: None,
                    reinvested: 0.0,
                    bankroll_after: bankroll,
                    bankroll_reset,
                });
                continue;
            }
        };

        let stake = per_bet_stake;
        let mut reinvested = 0.0;
        let (result, return_percent) = if correct {
            (round2(stake * (odds - 1.0)), ((odds - 1.0) * 100.0).round() as i64)
        } else {
            if params.reinvestment_threshold > 0.0
                && total_reinvested < params.reinvestment_threshold
            {
                reinvested = round2(
                    stake.min(params.reinvestment_threshold - total_reinvested),
                );
                total_reinvested += reinvested;
            }
            (-stake, -100)
        };

        bankroll = round2(bankroll + result + reinvested);
        out.push(SimRow {
            date: row.date,
            home: row.home,
            away: row.away,
            prediction: row.prediction,
            strength: row.strength,
            home_odds: row.home_odds,
            away_odds: row.away_odds,
            predicted_odds: Some(odds),
            correct: Some(correct),
            stake: Some(stake),
            result: Some(result),
            return_percent: Some(return_percent),
            reinvested,
            bankroll_after: bankroll,
            bankroll_reset,
        });
    }

    Ok(out)
}

fn qualify(row: &RawRow, params: &SimParams) -> Option<QualifiedRow> {
    let strength = record::number_field(row, STRENGTH_ALIASES)?;
    if strength < params.strength_threshold {
        return None;
    }
    let date = record::date_field(row, DATE_ALIASES)?;
    if date < params.season_start {
        return None;
    }

    let predicted_odds = record::predicted_odds(row);
    if let Some(cap) = params.max_odds {
        // With a cap configured, unresolved odds cannot prove themselves
        // under it, so those rows are dropped along with long shots.
        let odds = predicted_odds?;
        if odds > cap {
            return None;
        }
    }

    Some(QualifiedRow {
        date,
        home: record::string_field(row, HOME_ALIASES).unwrap_or_default(),
        away: record::string_field(row, AWAY_ALIASES).unwrap_or_default(),
        prediction: record::string_field(row, PREDICTION_ALIASES).unwrap_or_default(),
        strength,
        home_odds: record::number_field(row, HOME_ODDS_ALIASES),
        away_odds: record::number_field(row, AWAY_ODDS_ALIASES),
        predicted_odds,
        correctness: record::correctness(row),
    })
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_halves_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1200.0), 1200.0);
    }

    #[test]
    fn params_validation_rejects_caller_bugs() {
        let start = NaiveDate::from_ymd_opt(2024, 11, 22).unwrap();
        let mut p = SimParams::new(start);
        assert!(p.validate().is_ok());

        p.starting_bankroll = 0.0;
        assert!(p.validate().is_err());

        p = SimParams::new(start);
        p.daily_stake_percent = 140.0;
        assert!(p.validate().is_err());

        p = SimParams::new(start);
        p.daily_stake_percent = -1.0;
        assert!(p.validate().is_err());

        p = SimParams::new(start);
        p.max_odds = Some(1.0);
        assert!(p.validate().is_err());
    }
}
