use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::simulate::{SimParams, SimRow, round2};

/// Aggregate performance over one simulation run. Derived entirely from the
/// row sequence; holds no state of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_bets: usize,
    pub wins: usize,
    pub losses: usize,
    /// Whole-percent rounded, 0 when no bets settled.
    pub win_rate_percent: i64,
    pub total_pnl: f64,
    pub final_bankroll: f64,
    /// Total P&L over total staked, whole-percent rounded, 0 when nothing
    /// was staked.
    pub average_return_percent: i64,
    pub peak_bankroll: f64,
    /// Date the peak was first reached; None when the bankroll never rose
    /// above its starting value.
    pub peak_bankroll_date: Option<NaiveDate>,
}

pub fn summarize(rows: &[SimRow], params: &SimParams) -> Summary {
    let mut wins = 0usize;
    let mut losses = 0usize;
    let mut total_pnl = 0.0;
    let mut total_staked = 0.0;
    let mut peak_bankroll = params.starting_bankroll;
    let mut peak_bankroll_date = None;

    for row in rows {
        if let (Some(correct), Some(result), Some(stake)) = (row.correct, row.result, row.stake) {
            if correct {
                wins += 1;
            } else {
                losses += 1;
            }
            total_pnl += result;
            total_staked += stake;
        }
        // Strict comparison keeps the first date the peak was reached.
        if row.bankroll_after > peak_bankroll {
            peak_bankroll = row.bankroll_after;
            peak_bankroll_date = Some(row.date);
        }
    }

    // Resets and reinvested losses move the bankroll without touching P&L,
    // so the ending balance comes from the row stream, not start + pnl.
    let final_bankroll = rows
        .last()
        .map(|r| r.bankroll_after)
        .unwrap_or(params.starting_bankroll);

    let total_bets = wins + losses;
    let win_rate_percent = if total_bets > 0 {
        ((wins as f64 / total_bets as f64) * 100.0).round() as i64
    } else {
        0
    };
    let average_return_percent = if total_staked > 0.0 {
        ((total_pnl / total_staked) * 100.0).round() as i64
    } else {
        0
    };

    Summary {
        total_bets,
        wins,
        losses,
        win_rate_percent,
        total_pnl: round2(total_pnl),
        final_bankroll,
        average_return_percent,
        peak_bankroll,
        peak_bankroll_date,
    }
}
