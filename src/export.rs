use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::simulate::SimRow;
use crate::stats::Summary;

/// Write the simulated season to an .xlsx workbook: one sheet with the
/// per-bet rows, one with the aggregate results.
pub fn export_simulation(path: &Path, rows: &[SimRow], summary: &Summary) -> Result<()> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Simulation")?;
    write_rows_sheet(sheet, rows)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name("Overall Results")?;
    write_summary_sheet(sheet, summary)?;

    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(())
}

fn write_rows_sheet(sheet: &mut Worksheet, rows: &[SimRow]) -> Result<()> {
    let headers = [
        "Game Date",
        "Home Team",
        "Visitor Team",
        "Prediction",
        "Prediction Strength",
        "Home ML",
        "Away ML",
        "Pred ML",
        "Correct",
        "Win %",
        "Bet Amount",
        "Bet Result",
        "Current Bankroll",
        "Reset",
    ];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = (idx + 1) as u32;
        sheet.write_string(r, 0, row.date.to_string())?;
        sheet.write_string(r, 1, &row.home)?;
        sheet.write_string(r, 2, &row.away)?;
        sheet.write_string(r, 3, &row.prediction)?;
        sheet.write_number(r, 4, row.strength)?;
        write_opt_number(sheet, r, 5, row.home_odds)?;
        write_opt_number(sheet, r, 6, row.away_odds)?;
        write_opt_number(sheet, r, 7, row.predicted_odds)?;
        match row.correct {
            Some(true) => sheet.write_string(r, 8, "W")?,
            Some(false) => sheet.write_string(r, 8, "L")?,
            None => sheet.write_string(r, 8, "")?,
        };
        if let Some(pct) = row.return_percent {
            sheet.write_string(r, 9, format!("{pct}%"))?;
        }
        write_opt_number(sheet, r, 10, row.stake)?;
        write_opt_number(sheet, r, 11, row.result)?;
        sheet.write_number(r, 12, row.bankroll_after)?;
        sheet.write_string(r, 13, if row.bankroll_reset { "yes" } else { "" })?;
    }

    sheet.set_column_width(0, 12)?;
    for col in 1..4u16 {
        sheet.set_column_width(col, 18)?;
    }
    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, summary: &Summary) -> Result<()> {
    let rows: Vec<(&str, String)> = vec![
        ("Total Bets", summary.total_bets.to_string()),
        ("Wins", summary.wins.to_string()),
        ("Losses", summary.losses.to_string()),
        ("Win Rate", format!("{}%", summary.win_rate_percent)),
        ("Total P&L", format!("{:.2}", summary.total_pnl)),
        ("Final Bankroll", format!("{:.2}", summary.final_bankroll)),
        (
            "Avg ROI / Bet",
            format!("{}%", summary.average_return_percent),
        ),
        ("Max Bankroll", format!("{:.2}", summary.peak_bankroll)),
        (
            "Max Bankroll Date",
            summary
                .peak_bankroll_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
        ),
    ];
    for (idx, (label, value)) in rows.iter().enumerate() {
        sheet.write_string(idx as u32, 0, *label)?;
        sheet.write_string(idx as u32, 1, value)?;
    }
    sheet.set_column_width(0, 20)?;
    sheet.set_column_width(1, 16)?;
    Ok(())
}

fn write_opt_number(sheet: &mut Worksheet, row: u32, col: u16, value: Option<f64>) -> Result<()> {
    if let Some(v) = value {
        sheet.write_number(row, col, v)?;
    }
    Ok(())
}
