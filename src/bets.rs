use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::http_cache::app_cache_dir;

/// A bet the user actually placed, recorded against the recommendation it
/// came from. Kept separate from the simulation, which never reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct UserBet {
    pub id: i64,
    pub created_at: String,
    pub home_team: String,
    pub away_team: String,
    pub prediction: String,
    pub prediction_strength: Option<f64>,
    pub moneyline: Option<f64>,
    pub bet_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBet {
    pub home_team: String,
    pub away_team: String,
    pub prediction: String,
    pub prediction_strength: Option<f64>,
    pub moneyline: Option<f64>,
    pub bet_amount: f64,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("user_bets.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS bets_placed (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            prediction TEXT NOT NULL,
            prediction_strength REAL NULL,
            moneyline REAL NULL,
            bet_amount REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_bets_created ON bets_placed(created_at);
        "#,
    )
    .context("create bets schema")?;
    Ok(())
}

pub fn submit_bet(conn: &Connection, bet: &NewBet) -> Result<UserBet> {
    if !(bet.bet_amount > 0.0) {
        return Err(anyhow!("bet_amount must be positive, got {}", bet.bet_amount));
    }
    let created_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO bets_placed(created_at, home_team, away_team, prediction, prediction_strength, moneyline, bet_amount)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            created_at,
            bet.home_team,
            bet.away_team,
            bet.prediction,
            bet.prediction_strength,
            bet.moneyline,
            bet.bet_amount,
        ],
    )
    .context("insert bet")?;
    let id = conn.last_insert_rowid();
    get_bet(conn, id)?.ok_or_else(|| anyhow!("inserted bet {id} not found"))
}

pub fn list_bets(conn: &Connection) -> Result<Vec<UserBet>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, created_at, home_team, away_team, prediction, prediction_strength, moneyline, bet_amount
             FROM bets_placed ORDER BY created_at ASC, id ASC",
        )
        .context("prepare list bets")?;
    let rows = stmt
        .query_map([], map_bet_row)
        .context("query list bets")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode bet row")?);
    }
    Ok(out)
}

pub fn get_bet(conn: &Connection, id: i64) -> Result<Option<UserBet>> {
    conn.query_row(
        "SELECT id, created_at, home_team, away_team, prediction, prediction_strength, moneyline, bet_amount
         FROM bets_placed WHERE id = ?1",
        params![id],
        map_bet_row,
    )
    .optional()
    .context("query bet by id")
}

/// Update the stake on an existing bet, returning the updated row.
pub fn update_bet_amount(conn: &Connection, id: i64, bet_amount: f64) -> Result<UserBet> {
    if !(bet_amount > 0.0) {
        return Err(anyhow!("bet_amount must be positive, got {bet_amount}"));
    }
    let changed = conn
        .execute(
            "UPDATE bets_placed SET bet_amount = ?1 WHERE id = ?2",
            params![bet_amount, id],
        )
        .context("update bet amount")?;
    if changed == 0 {
        return Err(anyhow!("no bet with id {id}"));
    }
    get_bet(conn, id)?.ok_or_else(|| anyhow!("updated bet {id} not found"))
}

pub fn delete_bet(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM bets_placed WHERE id = ?1", params![id])
        .context("delete bet")?;
    Ok(deleted > 0)
}

fn map_bet_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserBet> {
    Ok(UserBet {
        id: row.get(0)?,
        created_at: row.get(1)?,
        home_team: row.get(2)?,
        away_team: row.get(3)?,
        prediction: row.get(4)?,
        prediction_strength: row.get(5)?,
        moneyline: row.get(6)?,
        bet_amount: row.get(7)?,
    })
}
