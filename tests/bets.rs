use rusqlite::Connection;

use betsim_terminal::bets::{self, NewBet};

fn open_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory sqlite");
    bets::init_schema(&conn).expect("schema init");
    conn
}

fn sample_bet() -> NewBet {
    NewBet {
        home_team: "Celtics".to_string(),
        away_team: "Lakers".to_string(),
        prediction: "Celtics".to_string(),
        prediction_strength: Some(82.0),
        moneyline: Some(1.72),
        bet_amount: 150.0,
    }
}

#[test]
fn submit_returns_the_stored_row() {
    let conn = open_test_db();
    let stored = bets::submit_bet(&conn, &sample_bet()).unwrap();
    assert!(stored.id > 0);
    assert_eq!(stored.home_team, "Celtics");
    assert_eq!(stored.bet_amount, 150.0);
    assert!(!stored.created_at.is_empty());
}

#[test]
fn list_returns_bets_in_insertion_order() {
    let conn = open_test_db();
    let first = bets::submit_bet(&conn, &sample_bet()).unwrap();
    let mut second_bet = sample_bet();
    second_bet.prediction = "Lakers".to_string();
    second_bet.bet_amount = 75.0;
    let second = bets::submit_bet(&conn, &second_bet).unwrap();

    let all = bets::list_bets(&conn).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, first.id);
    assert_eq!(all[1].id, second.id);
    assert_eq!(all[1].prediction, "Lakers");
}

#[test]
fn update_changes_only_the_amount() {
    let conn = open_test_db();
    let stored = bets::submit_bet(&conn, &sample_bet()).unwrap();
    let updated = bets::update_bet_amount(&conn, stored.id, 300.0).unwrap();
    assert_eq!(updated.id, stored.id);
    assert_eq!(updated.bet_amount, 300.0);
    assert_eq!(updated.prediction, stored.prediction);
    assert_eq!(updated.created_at, stored.created_at);
}

#[test]
fn update_missing_bet_is_an_error() {
    let conn = open_test_db();
    assert!(bets::update_bet_amount(&conn, 9999, 50.0).is_err());
}

#[test]
fn delete_removes_the_row() {
    let conn = open_test_db();
    let stored = bets::submit_bet(&conn, &sample_bet()).unwrap();
    assert!(bets::delete_bet(&conn, stored.id).unwrap());
    assert!(!bets::delete_bet(&conn, stored.id).unwrap());
    assert!(bets::list_bets(&conn).unwrap().is_empty());
}

#[test]
fn non_positive_amounts_are_rejected() {
    let conn = open_test_db();
    let mut bet = sample_bet();
    bet.bet_amount = 0.0;
    assert!(bets::submit_bet(&conn, &bet).is_err());

    let stored = bets::submit_bet(&conn, &sample_bet()).unwrap();
    assert!(bets::update_bet_amount(&conn, stored.id, -5.0).is_err());
}
