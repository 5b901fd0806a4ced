// SPDX-License-Identifier: MIT

//! Profit-tracker routes.
//!
//! Every mutation recomputes the aggregate stats blob and lands it in the
//! same store transaction as the transaction list, so the two can never
//! drift apart.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::keys;
use crate::error::{AppError, Result};
use crate::models::backup::{push_backup, BackupEntry, BackupSummary};
use crate::models::summary::TrackerSummary;
use crate::models::{PaymentMethod, TrackerStats, Transaction, WipeLog};
use crate::AppState;

const DEFAULT_DAILY_GOAL: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tracker", get(get_tracker))
        .route("/api/tracker/transactions", post(add_transaction))
        .route("/api/tracker/transactions/{id}", delete(delete_transaction))
        .route("/api/tracker/summary", get(get_summary))
        .route(
            "/api/tracker/daily-goal",
            get(get_daily_goal).post(set_daily_goal),
        )
        .route("/api/tracker/reset", post(reset_tracker))
        .route("/api/tracker/export", get(export_tracker))
        .route("/api/tracker/restore", post(restore_tracker))
        .route("/api/tracker/backups", get(list_backups))
}

#[derive(Serialize)]
pub struct TrackerState {
    pub transactions: Vec<Transaction>,
    pub stats: TrackerStats,
    pub wipe_logs: Vec<WipeLog>,
    pub daily_goal: u32,
}

async fn load_daily_goal(state: &AppState) -> Result<u32> {
    Ok(state
        .db
        .get::<u32>(keys::DAILY_GOAL)
        .await?
        .unwrap_or(DEFAULT_DAILY_GOAL))
}

/// Full tracker state in one response.
async fn get_tracker(State(state): State<Arc<AppState>>) -> Result<Json<TrackerState>> {
    let transactions: Vec<Transaction> = state.db.get_or_default(keys::TRANSACTIONS).await?;
    let stats: TrackerStats = state.db.get_or_default(keys::STATS).await?;
    let wipe_logs: Vec<WipeLog> = state.db.get_or_default(keys::WIPE_LOGS).await?;
    let daily_goal = load_daily_goal(&state).await?;

    Ok(Json(TrackerState {
        transactions,
        stats,
        wipe_logs,
        daily_goal,
    }))
}

#[derive(Deserialize)]
pub struct NewTransaction {
    pub cost: f64,
    pub paid_to_me: f64,
    pub method: PaymentMethod,
}

fn validate_amount(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::BadRequest(format!(
            "{} must be a non-negative number",
            name
        )));
    }
    Ok(())
}

async fn add_transaction(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewTransaction>,
) -> Result<Json<Transaction>> {
    validate_amount("cost", payload.cost)?;
    validate_amount("paid_to_me", payload.paid_to_me)?;

    let now = Utc::now().to_rfc3339();
    let transaction = Transaction::new(payload.cost, payload.paid_to_me, payload.method, &now);

    let mut transactions: Vec<Transaction> = state.db.get_or_default(keys::TRANSACTIONS).await?;
    transactions.push(transaction.clone());
    let stats = TrackerStats {
        total_profit: transactions.iter().map(|t| t.profit).sum(),
    };

    state
        .db
        .commit_many(&[
            (
                keys::TRANSACTIONS,
                serde_json::to_value(&transactions).map_err(anyhow::Error::from)?,
            ),
            (
                keys::STATS,
                serde_json::to_value(&stats).map_err(anyhow::Error::from)?,
            ),
        ])
        .await?;

    tracing::info!(id = %transaction.id, profit = transaction.profit, "Recorded transaction");
    Ok(Json(transaction))
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let mut transactions: Vec<Transaction> = state.db.get_or_default(keys::TRANSACTIONS).await?;
    let before = transactions.len();
    transactions.retain(|t| t.id != id);
    if transactions.len() == before {
        return Err(AppError::NotFound(format!("Transaction {} not found", id)));
    }

    let stats = TrackerStats {
        total_profit: transactions.iter().map(|t| t.profit).sum(),
    };

    state
        .db
        .commit_many(&[
            (
                keys::TRANSACTIONS,
                serde_json::to_value(&transactions).map_err(anyhow::Error::from)?,
            ),
            (
                keys::STATS,
                serde_json::to_value(&stats).map_err(anyhow::Error::from)?,
            ),
        ])
        .await?;

    Ok(Json(DeletedResponse { deleted: true }))
}

async fn get_summary(State(state): State<Arc<AppState>>) -> Result<Json<TrackerSummary>> {
    let transactions: Vec<Transaction> = state.db.get_or_default(keys::TRANSACTIONS).await?;
    let daily_goal = load_daily_goal(&state).await?;

    Ok(Json(TrackerSummary::from_transactions(
        &transactions,
        daily_goal,
        Utc::now(),
    )))
}

#[derive(Serialize, Deserialize)]
pub struct DailyGoal {
    pub daily_goal: u32,
}

async fn get_daily_goal(State(state): State<Arc<AppState>>) -> Result<Json<DailyGoal>> {
    let daily_goal = load_daily_goal(&state).await?;
    Ok(Json(DailyGoal { daily_goal }))
}

async fn set_daily_goal(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DailyGoal>,
) -> Result<Json<DailyGoal>> {
    if payload.daily_goal < 1 {
        return Err(AppError::BadRequest(
            "daily_goal must be at least 1".to_string(),
        ));
    }

    state.db.set(keys::DAILY_GOAL, &payload.daily_goal).await?;
    Ok(Json(payload))
}

/// Wipe the tracker: snapshot the current run into the wipe log (with its
/// fee split), then clear transactions and zero the stats, all in one
/// store transaction.
async fn reset_tracker(State(state): State<Arc<AppState>>) -> Result<Json<WipeLog>> {
    let transactions: Vec<Transaction> = state.db.get_or_default(keys::TRANSACTIONS).await?;
    let stats: TrackerStats = state.db.get_or_default(keys::STATS).await?;
    let mut wipe_logs: Vec<WipeLog> = state.db.get_or_default(keys::WIPE_LOGS).await?;

    let now = Utc::now().to_rfc3339();
    let log = WipeLog::from_transactions(&transactions, stats.total_profit, &now);
    wipe_logs.push(log.clone());

    state
        .db
        .commit_many(&[
            (
                keys::TRANSACTIONS,
                serde_json::to_value(Vec::<Transaction>::new()).map_err(anyhow::Error::from)?,
            ),
            (
                keys::STATS,
                serde_json::to_value(TrackerStats::default()).map_err(anyhow::Error::from)?,
            ),
            (
                keys::WIPE_LOGS,
                serde_json::to_value(&wipe_logs).map_err(anyhow::Error::from)?,
            ),
        ])
        .await?;

    tracing::info!(
        total_profit = log.total_profit,
        total_fees = log.total_fees,
        "Tracker wiped"
    );
    Ok(Json(log))
}

#[derive(Serialize, Deserialize)]
pub struct TrackerExport {
    pub transactions: Vec<Transaction>,
    pub stats: TrackerStats,
    pub wipe_logs: Vec<WipeLog>,
    pub daily_goal: u32,
    #[serde(default)]
    pub exported_at: String,
}

async fn export_tracker(State(state): State<Arc<AppState>>) -> Result<Json<TrackerExport>> {
    let transactions: Vec<Transaction> = state.db.get_or_default(keys::TRANSACTIONS).await?;
    let stats: TrackerStats = state.db.get_or_default(keys::STATS).await?;
    let wipe_logs: Vec<WipeLog> = state.db.get_or_default(keys::WIPE_LOGS).await?;
    let daily_goal = load_daily_goal(&state).await?;

    Ok(Json(TrackerExport {
        transactions,
        stats,
        wipe_logs,
        daily_goal,
        exported_at: Utc::now().to_rfc3339(),
    }))
}

#[derive(Serialize)]
pub struct RestoreResponse {
    pub restored: bool,
    pub backup_id: String,
}

/// Replace the whole tracker with a previously exported snapshot. The
/// pre-restore state is pushed onto the rolling backup list first, so a
/// bad restore is recoverable.
async fn restore_tracker(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<TrackerExport>,
) -> Result<Json<RestoreResponse>> {
    let current = TrackerExport {
        transactions: state.db.get_or_default(keys::TRANSACTIONS).await?,
        stats: state.db.get_or_default(keys::STATS).await?,
        wipe_logs: state.db.get_or_default(keys::WIPE_LOGS).await?,
        daily_goal: load_daily_goal(&state).await?,
        exported_at: String::new(),
    };

    let now = Utc::now().to_rfc3339();
    let entry = BackupEntry::new(
        serde_json::to_value(&current).map_err(anyhow::Error::from)?,
        &now,
    );
    let backup_id = entry.id.clone();

    let mut backups: Vec<BackupEntry> = state.db.get_or_default(keys::BACKUPS).await?;
    push_backup(&mut backups, entry);

    // Restored stats are recomputed rather than trusted from the snapshot
    let stats = TrackerStats {
        total_profit: snapshot.transactions.iter().map(|t| t.profit).sum(),
    };

    state
        .db
        .commit_many(&[
            (
                keys::TRANSACTIONS,
                serde_json::to_value(&snapshot.transactions).map_err(anyhow::Error::from)?,
            ),
            (
                keys::STATS,
                serde_json::to_value(&stats).map_err(anyhow::Error::from)?,
            ),
            (
                keys::WIPE_LOGS,
                serde_json::to_value(&snapshot.wipe_logs).map_err(anyhow::Error::from)?,
            ),
            (
                keys::DAILY_GOAL,
                serde_json::to_value(snapshot.daily_goal.max(1)).map_err(anyhow::Error::from)?,
            ),
            (
                keys::BACKUPS,
                serde_json::to_value(&backups).map_err(anyhow::Error::from)?,
            ),
        ])
        .await?;

    tracing::info!(backup_id = %backup_id, "Tracker restored from snapshot");
    Ok(Json(RestoreResponse {
        restored: true,
        backup_id,
    }))
}

async fn list_backups(State(state): State<Arc<AppState>>) -> Result<Json<Vec<BackupSummary>>> {
    let backups: Vec<BackupEntry> = state.db.get_or_default(keys::BACKUPS).await?;
    Ok(Json(backups.iter().map(BackupEntry::summary).collect()))
}
