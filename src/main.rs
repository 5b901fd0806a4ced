// SPDX-License-Identifier: MIT

//! Profit-Tracker API Server
//!
//! Serves the transaction tracker and the credential-pool link tool on top
//! of a flat key-value record store.

use profit_tracker::{config::Config, db::RecordStore, services::AlertSink, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Profit-Tracker API");

    // Initialize the record store
    let db = RecordStore::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to record store");

    // Failed-login alert sink (optional webhook)
    let alerts = AlertSink::new(config.alert_webhook_url.clone());
    if alerts.is_configured() {
        tracing::info!("Alert webhook configured");
    }

    // Build shared state
    let state = Arc::new(AppState { config: config.clone(), db, alerts });

    // Build router
    let app = profit_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("profit_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
