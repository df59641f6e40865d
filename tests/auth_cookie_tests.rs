// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! These tests verify cookie removal attributes on logout match the creation
//! attributes for localhost and production-style frontends.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

mod common;

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

fn logout_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/logout/")
        .header(header::COOKIE, "access_token=test; refresh_token=refresh")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let (app, _, _) = common::create_test_app_with_frontend_url("http://localhost:5173");

    let response = app.oneshot(logout_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    for name in ["access_token", "refresh_token"] {
        let cookie = find_cookie(&set_cookies, name);
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
        assert!(!cookie.contains("Domain="));
    }
}

#[tokio::test]
async fn test_logout_cookie_removal_production_attributes() {
    let (app, _, _) = common::create_test_app_with_frontend_url("https://nextshape.example.com");

    let response = app.oneshot(logout_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    for name in ["access_token", "refresh_token"] {
        let cookie = find_cookie(&set_cookies, name);
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Secure"));
    }
}

#[tokio::test]
async fn test_logout_without_session_is_no_content() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
