// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public calculator routes (no authentication, nothing stored).

use axum::{extract::rejection::JsonRejection, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::routes::json_body;
use crate::services::calculator::compute_bmi;
use crate::services::validation::{validate_bmi, BmiInput};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/calculate-bmi/", post(calculate_bmi))
}

#[derive(Serialize, Debug, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BmiResponse {
    pub bmi: f64,
}

async fn calculate_bmi(
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<BmiResponse>> {
    let input: BmiInput = json_body(payload)?;
    let (weight_kg, height_cm) = validate_bmi(&input)?;

    Ok(Json(BmiResponse {
        bmi: compute_bmi(weight_kg, height_cm),
    }))
}
