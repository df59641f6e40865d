// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes.
//!
//! Tokens are issued by the account service; this API only verifies them and
//! clears them on logout.

use axum::{extract::State, http::StatusCode, routing::post, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use crate::middleware::auth::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout/", post(logout))
}

/// Build a removal cookie matching the attributes the session cookie was set with.
///
/// Session cookies are only marked `Secure` when the frontend is served over HTTPS.
fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build(name)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Log out by expiring both session cookies.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let secure = state.config.frontend_url.starts_with("https://");
    let jar = jar
        .remove(expired_cookie(ACCESS_TOKEN_COOKIE, secure))
        .remove(expired_cookie(REFRESH_TOKEN_COOKIE, secure));

    (jar, StatusCode::NO_CONTENT)
}
