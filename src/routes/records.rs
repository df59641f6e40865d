// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress record routes (require authentication).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityLevel, Goal, ProgressRecord};
use crate::response::ApiResponse;
use crate::routes::json_body;
use crate::services::validation::{CreateRecordInput, UpdateRecordInput};
use crate::time_utils::{format_utc_rfc3339, local_today};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Progress record routes.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/calculate-calories/", post(create_record))
        .route("/progress-records/", get(list_records))
        .route(
            "/progress-records/{id}/",
            get(get_record).patch(update_record).delete(delete_record),
        )
}

/// Progress record as returned to clients.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecordResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    pub bmi: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub bmr: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub tdee: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub recommended_calories: i64,
    pub created_at: String,
    pub modified_at: String,
}

impl From<ProgressRecord> for RecordResponse {
    fn from(record: ProgressRecord) -> Self {
        Self {
            id: record.id,
            date: record.date.format("%Y-%m-%d").to_string(),
            weight_kg: record.weight_kg,
            height_cm: record.height_cm,
            activity_level: record.activity_level,
            goal: record.goal,
            bmi: record.bmi,
            bmr: record.bmr,
            tdee: record.tdee,
            recommended_calories: record.recommended_calories,
            created_at: format_utc_rfc3339(record.created_at),
            modified_at: format_utc_rfc3339(record.modified_at),
        }
    }
}

/// Record id from the path. An id that is not a number cannot exist.
fn record_id(path: std::result::Result<Path<u64>, PathRejection>) -> Result<u64> {
    path.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Unparseable record id");
        AppError::NotFound
    })
}

/// Create today's record and return its computed values.
async fn create_record(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<RecordResponse>>)> {
    let input: CreateRecordInput = json_body(payload)?;
    let record = state.records.create(&user, &input, local_today()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Calories calculated successfully.",
            record.into(),
        )),
    ))
}

/// List the caller's records, most recent first.
async fn list_records(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<RecordResponse>>>> {
    let records = state.records.list(&user).await?;

    Ok(Json(ApiResponse::success(
        "Progress records retrieved.",
        records.into_iter().map(RecordResponse::from).collect(),
    )))
}

async fn get_record(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    path: std::result::Result<Path<u64>, PathRejection>,
) -> Result<Json<ApiResponse<RecordResponse>>> {
    let id = record_id(path)?;
    let record = state.records.get(&user, id).await?;

    Ok(Json(ApiResponse::success(
        "Progress record retrieved.",
        record.into(),
    )))
}

/// Partially update a record; derived values are recomputed.
async fn update_record(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    path: std::result::Result<Path<u64>, PathRejection>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<RecordResponse>>> {
    let id = record_id(path)?;
    let input: UpdateRecordInput = json_body(payload)?;
    let record = state
        .records
        .update(&user, id, &input, local_today())
        .await?;

    Ok(Json(ApiResponse::success(
        "Progress record updated.",
        record.into(),
    )))
}

async fn delete_record(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    path: std::result::Result<Path<u64>, PathRejection>,
) -> Result<StatusCode> {
    let id = record_id(path)?;
    state.records.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
