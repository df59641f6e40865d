// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile lookup for identity resolution)
//! - Progress records (one document per user and day)

use async_trait::async_trait;
use chrono::NaiveDate;
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use super::{collections, ProgressStore};
use crate::error::AppError;
use crate::models::record::day_key;
use crate::models::{NewProgressRecord, ProgressRecord, User};

/// Record ids stay within the integer range JavaScript clients can represent.
const RECORD_ID_MASK: u64 = (1 << 53) - 1;

/// Fresh ids drawn before giving up on a create.
const MAX_ID_ATTEMPTS: usize = 5;

/// Owner and day of a record id, stored under the id in `progress_record_ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordIdClaim {
    user_id: u64,
    date: NaiveDate,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
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
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    fn new_record_id() -> Result<u64, AppError> {
        let mut bytes = [0u8; 8];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Random id generation failed")))?;
        Ok(u64::from_le_bytes(bytes) & RECORD_ID_MASK)
    }

    /// Reserve an unused record id for the given user and day.
    ///
    /// The claim document is created with a must-not-exist precondition, so
    /// two records can never share an id.
    async fn claim_record_id(&self, user_id: u64, date: NaiveDate) -> Result<u64, AppError> {
        let claim = RecordIdClaim { user_id, date };

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = Self::new_record_id()?;
            let result: Result<(), FirestoreError> = self
                .get_client()?
                .fluent()
                .insert()
                .into(collections::RECORD_IDS)
                .document_id(id.to_string())
                .object(&claim)
                .execute()
                .await;

            match result {
                Ok(()) => return Ok(id),
                Err(FirestoreError::DataConflictError(_)) => {
                    tracing::warn!(id, "Record id already taken, drawing another");
                }
                Err(e) => return Err(AppError::Database(e.to_string())),
            }
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "No free record id after {} attempts",
            MAX_ID_ATTEMPTS
        )))
    }

    async fn get_id_claim(&self, id: u64) -> Result<Option<RecordIdClaim>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RECORD_IDS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn release_record_id(&self, id: u64) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::RECORD_IDS)
            .document_id(id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl ProgressStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Progress Record Operations ─────────────────────────────

    async fn find_by_user_and_date(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<ProgressRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROGRESS_RECORDS)
            .obj()
            .one(&day_key(user_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Uses a create precondition on the `{user_id}_{date}` document, so a
    /// concurrent insert for the same day fails with AlreadyExists.
    async fn insert_unique(
        &self,
        record: NewProgressRecord,
    ) -> Result<Option<ProgressRecord>, AppError> {
        let id = self.claim_record_id(record.user_id, record.date).await?;
        let record = record.into_record(id);

        let result: Result<(), FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::PROGRESS_RECORDS)
            .document_id(record.day_key())
            .object(&record)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(Some(record)),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::debug!(
                    user_id = record.user_id,
                    date = %record.date,
                    "Progress record already exists for day"
                );
                self.release_record_id(id).await?;
                Ok(None)
            }
            Err(e) => {
                if let Err(release) = self.release_record_id(id).await {
                    tracing::warn!(id, error = %release, "Failed to release record id");
                }
                Err(AppError::Database(e.to_string()))
            }
        }
    }

    async fn find_by_id_and_user(
        &self,
        id: u64,
        user_id: u64,
    ) -> Result<Option<ProgressRecord>, AppError> {
        let Some(claim) = self.get_id_claim(id).await? else {
            return Ok(None);
        };
        if claim.user_id != user_id {
            return Ok(None);
        }

        Ok(self
            .find_by_user_and_date(claim.user_id, claim.date)
            .await?
            .filter(|record| record.id == id))
    }

    /// Writes with an exists precondition, so a record deleted after the
    /// id check is not recreated.
    async fn update(&self, record: &ProgressRecord) -> Result<(), AppError> {
        match self
            .find_by_user_and_date(record.user_id, record.date)
            .await?
        {
            Some(stored) if stored.id == record.id => {}
            _ => return Err(AppError::NotFound),
        }

        let result: Result<(), FirestoreError> = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PROGRESS_RECORDS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(record.day_key())
            .object(record)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(FirestoreError::DataNotFoundError(_)) => Err(AppError::NotFound),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn delete_by_id(&self, id: u64) -> Result<bool, AppError> {
        let Some(claim) = self.get_id_claim(id).await? else {
            return Ok(false);
        };

        let existed = match self.find_by_user_and_date(claim.user_id, claim.date).await? {
            Some(record) if record.id == id => {
                self.get_client()?
                    .fluent()
                    .delete()
                    .from(collections::PROGRESS_RECORDS)
                    .document_id(day_key(claim.user_id, claim.date))
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                true
            }
            _ => false,
        };

        self.release_record_id(id).await?;
        Ok(existed)
    }

    async fn list_by_user_ordered(&self, user_id: u64) -> Result<Vec<ProgressRecord>, AppError> {
        // Dates are stored as YYYY-MM-DD, so string order is date order
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PROGRESS_RECORDS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
