// SPDX-License-Identifier: MIT

//! Profit-Tracker: internal business tooling API
//!
//! Backend API for the transaction/profit tracker and the credential-pool
//! link tool. All state lives in a flat key-value record store; handlers do
//! read-modify-write cycles over whole blobs.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::RecordStore;
use services::AlertSink;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: RecordStore,
    pub alerts: AlertSink,
}
