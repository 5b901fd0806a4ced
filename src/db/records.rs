// SPDX-License-Identifier: MIT

//! Record store client with flat key-value semantics.
//!
//! The store is Firestore, but it is deliberately used as a blob store: a
//! single `records` collection, one document per key, each document an
//! envelope around an arbitrary JSON value. There are no queries and no
//! indexes; every mutation is read-whole-blob / write-whole-blob.
//!
//! Writes that must land together (e.g. a lifecycle transition touching the
//! identities, available and retired blobs) go through [`RecordStore::commit_many`],
//! which stages all documents in one Firestore transaction.

use crate::error::AppError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// All blobs live in this one collection, keyed by record-store key.
const RECORDS: &str = "records";

/// Wrapper so arrays and scalars can be stored as Firestore documents,
/// which must be maps at the top level.
#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    value: T,
}

/// Flat key-value record store client.
#[derive(Clone)]
pub struct RecordStore {
    client: Option<firestore::FirestoreDb>,
}

impl RecordStore {
    /// Create a new record store client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to record store: {}", e)))?;

        tracing::info!(project = project_id, "Connected to record store");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to record store (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All store operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Record store not connected (offline mode)".to_string()))
    }

    /// Get the blob stored under `key`, or `None` if the key is absent.
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let envelope: Option<Envelope<T>> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(RECORDS)
            .obj()
            .one(key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(envelope.map(|e| e.value))
    }

    /// Get the blob stored under `key`, falling back to `T::default()`.
    pub async fn get_or_default<T>(&self, key: &str) -> Result<T, AppError>
    where
        T: DeserializeOwned + Default + Send,
    {
        Ok(self.get(key).await?.unwrap_or_default())
    }

    /// Overwrite the blob stored under `key`.
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize + Send + Sync,
    {
        // The fluent object() call needs an owned, deserializable payload
        let value = serde_json::to_value(value).map_err(anyhow::Error::from)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(RECORDS)
            .document_id(key)
            .object(&Envelope { value })
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Overwrite several blobs in a single store transaction.
    ///
    /// This is the unit of atomicity for every multi-blob mutation: either
    /// all keys land or none do. Firestore retries the transaction on
    /// conflict with fresh data, preventing lost updates between the staged
    /// documents.
    pub async fn commit_many(
        &self,
        writes: &[(&str, serde_json::Value)],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for (key, value) in writes {
            client
                .fluent()
                .update()
                .in_col(RECORDS)
                .document_id(*key)
                .object(&Envelope {
                    value: value.clone(),
                })
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to stage write for {}: {}", key, e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(keys = writes.len(), "Committed multi-key record write");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_store_set_fails_offline() {
        let db = RecordStore::new_mock();

        // Scalar and list payloads both go through the owned-value envelope
        let err = db.set("daily_goal", &100u32).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        let err = db
            .set("transactions", &vec!["a".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_mock_store_get_fails_offline() {
        let db = RecordStore::new_mock();
        let err = db.get::<u32>("daily_goal").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
