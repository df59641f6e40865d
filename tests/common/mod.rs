// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::NaiveDate;
use nextshape_api::config::Config;
use nextshape_api::db::{FirestoreDb, MemoryDb, ProgressStore};
use nextshape_api::middleware::auth::create_jwt;
use nextshape_api::models::{Sex, User};
use nextshape_api::routes::create_router;
use nextshape_api::AppState;
use serde_json::Value;
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

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by an in-memory store.
/// Returns the router, the shared state and the store itself.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryDb>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(
    frontend_url: &str,
) -> (axum::Router, Arc<AppState>, Arc<MemoryDb>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_config(config)
}

fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>, Arc<MemoryDb>) {
    let memory = Arc::new(MemoryDb::new());
    let db: Arc<dyn ProgressStore> = memory.clone();
    let state = Arc::new(AppState::new(config, db));

    (create_router(state.clone()), state, memory)
}

/// A profile born on 1990-06-15.
#[allow(dead_code)]
pub fn test_user(id: u64, sex: Sex) -> User {
    User {
        id,
        email: format!("user{}@example.com", id),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
        sex,
    }
}

/// Store a profile and return a bearer token for it.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, user: User) -> String {
    state.db.upsert_user(&user).await.unwrap();
    create_jwt(user.id, &state.config.jwt_signing_key).unwrap()
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
