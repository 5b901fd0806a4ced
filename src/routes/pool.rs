// SPDX-License-Identifier: MIT

//! Credential-pool routes.
//!
//! The pool is stored as four blobs (identities, available cards, retired
//! cards, link history). Handlers load what they need, mutate in memory via
//! [`PoolState`], and write every touched blob back in one store
//! transaction.

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
use crate::models::pool::ImportReport;
use crate::models::{
    Credential, GeneratedLink, Identity, LinkStyle, PoolState, UsageAction, UsageState,
};
use crate::services::{import, links};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/pool", get(get_pool))
        .route("/api/pool/cards/import", post(import_cards))
        .route("/api/pool/cards/{id}/identity", post(assign_identity))
        .route("/api/pool/cards/{id}/status", post(set_card_status))
        .route("/api/pool/cards/{id}", delete(delete_card))
        .route("/api/pool/identities/import", post(import_identities))
        .route("/api/pool/identities/{id}/status", post(set_identity_status))
        .route("/api/pool/identities/{id}", delete(delete_identity))
        .route("/api/pool/links", post(generate_link).delete(clear_links))
        .route("/api/pool/usage", post(record_usage))
        .route("/api/pool/export", get(export_pool))
        .route("/api/pool/restore", post(restore_pool))
        .route("/api/pool/backups", get(list_backups))
}

async fn load_pool(state: &AppState) -> Result<PoolState> {
    Ok(PoolState {
        identities: state.db.get_or_default(keys::POOL_IDENTITIES).await?,
        available: state.db.get_or_default(keys::POOL_AVAILABLE_CARDS).await?,
        retired: state.db.get_or_default(keys::POOL_RETIRED_CARDS).await?,
        link_history: state.db.get_or_default(keys::POOL_LINK_HISTORY).await?,
    })
}

/// Write all four pool blobs back in one store transaction.
async fn save_pool(state: &AppState, pool: &PoolState) -> Result<()> {
    state
        .db
        .commit_many(&[
            (
                keys::POOL_IDENTITIES,
                serde_json::to_value(&pool.identities).map_err(anyhow::Error::from)?,
            ),
            (
                keys::POOL_AVAILABLE_CARDS,
                serde_json::to_value(&pool.available).map_err(anyhow::Error::from)?,
            ),
            (
                keys::POOL_RETIRED_CARDS,
                serde_json::to_value(&pool.retired).map_err(anyhow::Error::from)?,
            ),
            (
                keys::POOL_LINK_HISTORY,
                serde_json::to_value(&pool.link_history).map_err(anyhow::Error::from)?,
            ),
        ])
        .await
}

async fn get_pool(State(state): State<Arc<AppState>>) -> Result<Json<PoolState>> {
    Ok(Json(load_pool(&state).await?))
}

#[derive(Deserialize)]
pub struct ImportRequest {
    pub input: String,
}

async fn import_cards(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportReport>> {
    let now = Utc::now().to_rfc3339();
    let parsed = import::parse_card_lines(&payload.input, &now);
    if parsed.is_empty() {
        return Err(AppError::BadRequest("No cards found in input".to_string()));
    }

    let mut pool = load_pool(&state).await?;
    let report = pool.import_cards(parsed);
    save_pool(&state, &pool).await?;

    tracing::info!(
        added = report.added,
        duplicates = report.duplicates,
        "Imported card batch"
    );
    Ok(Json(report))
}

#[derive(Serialize)]
pub struct IdentityImportReport {
    pub added: u32,
    pub total_identities: u32,
}

async fn import_identities(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<IdentityImportReport>> {
    let now = Utc::now().to_rfc3339();
    let parsed = import::parse_identity_lines(&payload.input, &now)?;
    let added = parsed.len() as u32;

    let mut pool = load_pool(&state).await?;
    // Duplicate emails are allowed: the same address can carry several promos
    pool.identities.extend(parsed);
    save_pool(&state, &pool).await?;

    tracing::info!(added, "Imported identity batch");
    Ok(Json(IdentityImportReport {
        added,
        total_identities: pool.identities.len() as u32,
    }))
}

#[derive(Deserialize)]
pub struct AssignIdentityRequest {
    pub identity_id: String,
}

async fn assign_identity(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<String>,
    Json(payload): Json<AssignIdentityRequest>,
) -> Result<Json<Credential>> {
    let mut pool = load_pool(&state).await?;
    pool.assign_identity(&card_id, &payload.identity_id)?;
    save_pool(&state, &pool).await?;

    let card = pool
        .find_available(&card_id)
        .ok_or_else(|| AppError::NotFound(format!("Card {} not found", card_id)))?
        .clone();
    Ok(Json(card))
}

#[derive(Deserialize)]
pub struct StatusOverrideRequest {
    pub usage_state: UsageState,
}

async fn set_card_status(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<String>,
    Json(payload): Json<StatusOverrideRequest>,
) -> Result<Json<Credential>> {
    let now = Utc::now().to_rfc3339();
    let mut pool = load_pool(&state).await?;
    pool.override_card_state(&card_id, payload.usage_state, &now)?;
    save_pool(&state, &pool).await?;

    let card = pool
        .find_card(&card_id)
        .ok_or_else(|| AppError::NotFound(format!("Card {} not found", card_id)))?
        .clone();
    Ok(Json(card))
}

async fn set_identity_status(
    State(state): State<Arc<AppState>>,
    Path(identity_id): Path<String>,
    Json(payload): Json<StatusOverrideRequest>,
) -> Result<Json<Identity>> {
    let now = Utc::now().to_rfc3339();
    let mut pool = load_pool(&state).await?;
    pool.override_identity_state(&identity_id, payload.usage_state, &now)?;
    save_pool(&state, &pool).await?;

    let identity = pool
        .find_identity(&identity_id)
        .ok_or_else(|| AppError::NotFound(format!("Identity {} not found", identity_id)))?
        .clone();
    Ok(Json(identity))
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

async fn delete_card(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let mut pool = load_pool(&state).await?;
    pool.remove_card(&card_id)?;
    save_pool(&state, &pool).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

async fn delete_identity(
    State(state): State<Arc<AppState>>,
    Path(identity_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let mut pool = load_pool(&state).await?;
    pool.remove_identity(&identity_id)?;
    save_pool(&state, &pool).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

#[derive(Deserialize)]
pub struct GenerateLinkRequest {
    pub card_id: String,
    /// Explicit identity selection; falls back to the card's linked
    /// identity when omitted.
    #[serde(default)]
    pub identity_id: Option<String>,
    pub base_url: String,
    pub style: LinkStyle,
}

#[derive(Serialize)]
pub struct GenerateLinkResponse {
    pub url: String,
    pub link_id: String,
    /// Identity fields the caller presents alongside the link. For potato
    /// links the email never appears in the URL, only here.
    pub email: Option<String>,
    pub promo_label: Option<String>,
    pub identity_id: Option<String>,
}

async fn generate_link(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateLinkRequest>,
) -> Result<Json<GenerateLinkResponse>> {
    let mut pool = load_pool(&state).await?;

    let card = pool
        .find_available(&payload.card_id)
        .ok_or_else(|| {
            AppError::BadRequest(format!("Card {} is not available", payload.card_id))
        })?
        .clone();

    let identity = match &payload.identity_id {
        Some(id) => Some(
            pool.find_identity(id)
                .ok_or_else(|| AppError::NotFound(format!("Identity {} not found", id)))?,
        ),
        None => pool.auto_pair(&card),
    };
    if let Some(identity) = identity {
        if identity.usage_state == UsageState::Used {
            return Err(AppError::BadRequest(format!(
                "Identity {} is already used",
                identity.id
            )));
        }
    }

    let email = identity.map(|i| i.email.clone());
    let promo_label = identity.map(|i| i.promo_label.clone());
    let identity_id = identity.map(|i| i.id.clone());

    let url = links::assemble(&payload.base_url, &card, email.as_deref(), payload.style)?;

    let now = Utc::now().to_rfc3339();
    let record = GeneratedLink::new(
        &payload.base_url,
        &url,
        &card.card_number,
        email.as_deref().unwrap_or(""),
        payload.style,
        &now,
    );
    let link_id = record.id.clone();
    pool.link_history.push(record);
    save_pool(&state, &pool).await?;

    tracing::info!(
        card = %crate::models::credential::mask_card_number(&card.card_number),
        email = %email.as_deref().map(crate::models::identity::mask_email).unwrap_or_default(),
        style = ?payload.style,
        "Generated link"
    );
    Ok(Json(GenerateLinkResponse {
        url,
        link_id,
        email,
        promo_label,
        identity_id,
    }))
}

#[derive(Serialize)]
pub struct ClearedResponse {
    pub cleared: u32,
}

async fn clear_links(State(state): State<Arc<AppState>>) -> Result<Json<ClearedResponse>> {
    let mut pool = load_pool(&state).await?;
    let cleared = pool.link_history.len() as u32;
    pool.link_history.clear();
    save_pool(&state, &pool).await?;
    Ok(Json(ClearedResponse { cleared }))
}

#[derive(Deserialize)]
pub struct UsageRequest {
    pub card_id: String,
    pub identity_id: String,
    pub action: UsageAction,
}

/// Apply the operator's verdict after a link was handed out.
async fn record_usage(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UsageRequest>,
) -> Result<Json<PoolState>> {
    let now = Utc::now().to_rfc3339();
    let mut pool = load_pool(&state).await?;
    pool.apply_usage(&payload.card_id, &payload.identity_id, payload.action, &now)?;
    save_pool(&state, &pool).await?;

    tracing::info!(action = ?payload.action, "Recorded usage verdict");
    Ok(Json(pool))
}

#[derive(Serialize, Deserialize)]
pub struct PoolExport {
    pub identities: Vec<Identity>,
    pub available: Vec<Credential>,
    pub retired: Vec<Credential>,
    pub link_history: Vec<GeneratedLink>,
    #[serde(default)]
    pub exported_at: String,
}

async fn export_pool(State(state): State<Arc<AppState>>) -> Result<Json<PoolExport>> {
    let pool = load_pool(&state).await?;
    Ok(Json(PoolExport {
        identities: pool.identities,
        available: pool.available,
        retired: pool.retired,
        link_history: pool.link_history,
        exported_at: Utc::now().to_rfc3339(),
    }))
}

#[derive(Serialize)]
pub struct RestoreResponse {
    pub restored: bool,
    pub backup_id: String,
}

/// Replace the whole pool with a previously exported snapshot, after
/// pushing the current state onto the rolling backup list.
async fn restore_pool(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<PoolExport>,
) -> Result<Json<RestoreResponse>> {
    let current = load_pool(&state).await?;

    let now = Utc::now().to_rfc3339();
    let entry = BackupEntry::new(
        serde_json::to_value(&current).map_err(anyhow::Error::from)?,
        &now,
    );
    let backup_id = entry.id.clone();

    let mut backups: Vec<BackupEntry> = state.db.get_or_default(keys::POOL_BACKUPS).await?;
    push_backup(&mut backups, entry);

    state
        .db
        .commit_many(&[
            (
                keys::POOL_IDENTITIES,
                serde_json::to_value(&snapshot.identities).map_err(anyhow::Error::from)?,
            ),
            (
                keys::POOL_AVAILABLE_CARDS,
                serde_json::to_value(&snapshot.available).map_err(anyhow::Error::from)?,
            ),
            (
                keys::POOL_RETIRED_CARDS,
                serde_json::to_value(&snapshot.retired).map_err(anyhow::Error::from)?,
            ),
            (
                keys::POOL_LINK_HISTORY,
                serde_json::to_value(&snapshot.link_history).map_err(anyhow::Error::from)?,
            ),
            (
                keys::POOL_BACKUPS,
                serde_json::to_value(&backups).map_err(anyhow::Error::from)?,
            ),
        ])
        .await?;

    tracing::info!(backup_id = %backup_id, "Pool restored from snapshot");
    Ok(Json(RestoreResponse {
        restored: true,
        backup_id,
    }))
}

async fn list_backups(State(state): State<Arc<AppState>>) -> Result<Json<Vec<BackupSummary>>> {
    let backups: Vec<BackupEntry> = state.db.get_or_default(keys::POOL_BACKUPS).await?;
    Ok(Json(backups.iter().map(BackupEntry::summary).collect()))
}
