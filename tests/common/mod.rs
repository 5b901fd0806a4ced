// SPDX-License-Identifier: MIT

use profit_tracker::config::Config;
use profit_tracker::db::RecordStore;
use profit_tracker::middleware::create_jwt;
use profit_tracker::routes::create_router;
use profit_tracker::services::AlertSink;
use profit_tracker::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a record store connected to the emulator.
#[allow(dead_code)]
pub async fn test_db() -> RecordStore {
    RecordStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock record store (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> RecordStore {
    RecordStore::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let alerts = AlertSink::new(None);

    let state = Arc::new(AppState { config, db, alerts });

    (create_router(state.clone()), state)
}

/// Mint a valid session token for the test app's signing key.
#[allow(dead_code)]
pub fn create_test_jwt(signing_key: &[u8]) -> String {
    create_jwt(signing_key).expect("Failed to create test JWT")
}
