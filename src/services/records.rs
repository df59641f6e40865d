// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress record lifecycle.
//!
//! A record goes non-existent -> active -> active (updated)* -> deleted.
//! Every operation is scoped to the calling user: records owned by someone
//! else behave exactly like records that do not exist.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use crate::db::ProgressStore;
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{NewProgressRecord, ProgressRecord};
use crate::services::calculator;
use crate::services::validation::{self, CreateRecordInput, UpdateRecordInput};

/// Orchestrates validation, calculation and storage of progress records.
#[derive(Clone)]
pub struct RecordService {
    db: Arc<dyn ProgressStore>,
}

impl RecordService {
    pub fn new(db: Arc<dyn ProgressStore>) -> Self {
        Self { db }
    }

    /// Create today's record for `user`.
    pub async fn create(
        &self,
        user: &AuthUser,
        input: &CreateRecordInput,
        today: NaiveDate,
    ) -> Result<ProgressRecord> {
        let valid = validation::validate_create(input, user, today)?;
        validation::ensure_no_record_for_day(self.db.as_ref(), user.user_id, today).await?;

        let metrics = calculator::compute(
            valid.weight_kg,
            valid.height_cm,
            valid.age,
            valid.sex,
            valid.activity_level,
            valid.goal,
        );

        let new_record = NewProgressRecord {
            user_id: user.user_id,
            date: today,
            weight_kg: valid.weight_kg,
            height_cm: valid.height_cm,
            activity_level: valid.activity_level,
            goal: valid.goal,
            metrics,
            created_at: Utc::now(),
        };

        let record = self.db.insert_unique(new_record).await?.ok_or_else(|| {
            // Lost a race with a concurrent create for the same day
            AppError::Validation(FieldErrors::non_field(validation::DUPLICATE_DAY))
        })?;

        tracing::info!(
            user_id = user.user_id,
            record_id = record.id,
            date = %record.date,
            bmr = record.bmr,
            tdee = record.tdee,
            "Progress record created"
        );

        Ok(record)
    }

    /// All of the user's records, most recent first.
    pub async fn list(&self, user: &AuthUser) -> Result<Vec<ProgressRecord>> {
        let records = self.db.list_by_user_ordered(user.user_id).await?;
        tracing::debug!(
            user_id = user.user_id,
            count = records.len(),
            "Listed progress records"
        );
        Ok(records)
    }

    pub async fn get(&self, user: &AuthUser, id: u64) -> Result<ProgressRecord> {
        self.db
            .find_by_id_and_user(id, user.user_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Apply the supplied input fields and recompute every derived value.
    ///
    /// Age is taken from the owner's birth date at `today`; sex from the
    /// owner's profile.
    pub async fn update(
        &self,
        user: &AuthUser,
        id: u64,
        input: &UpdateRecordInput,
        today: NaiveDate,
    ) -> Result<ProgressRecord> {
        let mut record = self.get(user, id).await?;
        let patch = validation::validate_update(input)?;

        patch.apply_to(&mut record);
        record.apply_metrics(calculator::compute(
            record.weight_kg,
            record.height_cm,
            user.age_on(today),
            user.sex,
            record.activity_level,
            record.goal,
        ));
        record.modified_at = Utc::now();

        self.db.update(&record).await?;

        tracing::info!(
            user_id = user.user_id,
            record_id = record.id,
            fields_changed = !patch.is_empty(),
            "Progress record updated"
        );

        Ok(record)
    }

    /// Permanently delete one of the user's records.
    pub async fn delete(&self, user: &AuthUser, id: u64) -> Result<()> {
        let record = self.get(user, id).await?;

        if !self.db.delete_by_id(record.id).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(
            user_id = user.user_id,
            record_id = record.id,
            date = %record.date,
            "Progress record deleted"
        );

        Ok(())
    }
}
