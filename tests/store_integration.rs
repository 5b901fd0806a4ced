// SPDX-License-Identifier: MIT

//! Record store integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set). The emulator provides a clean state for
//! each test run; keys are suffixed per test for isolation.

use profit_tracker::models::{PaymentMethod, TrackerStats, Transaction};

mod common;
use common::test_db;

/// Unique key suffix so tests can run concurrently against one emulator.
fn unique_key(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}_{}", prefix, nanos)
}

#[tokio::test]
async fn test_get_of_absent_key_is_none() {
    require_emulator!();

    let db = test_db().await;
    let key = unique_key("absent");

    let value: Option<Vec<Transaction>> = db.get(&key).await.unwrap();
    assert!(value.is_none());

    let defaulted: Vec<Transaction> = db.get_or_default(&key).await.unwrap();
    assert!(defaulted.is_empty());
}

#[tokio::test]
async fn test_set_then_get_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let key = unique_key("transactions");

    let transactions = vec![Transaction::new(
        10.0,
        35.0,
        PaymentMethod::Zelle,
        "2024-01-15T10:00:00Z",
    )];
    db.set(&key, &transactions).await.unwrap();

    let loaded: Vec<Transaction> = db.get(&key).await.unwrap().expect("blob should exist");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].profit, 25.0);
    assert_eq!(loaded[0].id, transactions[0].id);
}

#[tokio::test]
async fn test_set_overwrites_whole_blob() {
    require_emulator!();

    let db = test_db().await;
    let key = unique_key("goal");

    db.set(&key, &100u32).await.unwrap();
    db.set(&key, &250u32).await.unwrap();

    let goal: Option<u32> = db.get(&key).await.unwrap();
    assert_eq!(goal, Some(250));
}

#[tokio::test]
async fn test_commit_many_lands_all_keys() {
    require_emulator!();

    let db = test_db().await;
    let tx_key = unique_key("transactions");
    let stats_key = unique_key("stats");

    let transactions = vec![Transaction::new(
        0.0,
        40.0,
        PaymentMethod::CashApp,
        "2024-01-15T10:00:00Z",
    )];
    let stats = TrackerStats { total_profit: 40.0 };

    db.commit_many(&[
        (&tx_key, serde_json::to_value(&transactions).unwrap()),
        (&stats_key, serde_json::to_value(&stats).unwrap()),
    ])
    .await
    .unwrap();

    let loaded_tx: Vec<Transaction> = db.get_or_default(&tx_key).await.unwrap();
    let loaded_stats: TrackerStats = db.get_or_default(&stats_key).await.unwrap();
    assert_eq!(loaded_tx.len(), 1);
    assert_eq!(loaded_stats.total_profit, 40.0);
}
