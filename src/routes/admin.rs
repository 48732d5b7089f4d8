// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin area routes.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::admin::{
    admin_cookie, clear_admin_cookie, create_admin_token, is_admin, validate_credentials,
    ADMIN_LOGIN_PATH,
};
use crate::AppState;

/// Admin routes. The admin gate is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(admin_summary))
        .route(ADMIN_LOGIN_PATH, get(login_status).post(login).delete(logout))
}

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct AdminStatus {
    pub authenticated: bool,
}

#[derive(Serialize)]
pub struct AdminSummary {
    pub authenticated: bool,
    pub username: String,
    pub offline: bool,
}

/// Whether the caller already holds an admin session.
async fn login_status(State(state): State<Arc<AppState>>, jar: CookieJar) -> Json<AdminStatus> {
    Json(AdminStatus {
        authenticated: is_admin(&jar, &state.config.jwt_signing_key),
    })
}

/// Check credentials and set the signed admin cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<AdminLoginRequest>,
) -> Result<(CookieJar, Json<AdminStatus>)> {
    let (Some(username), Some(password)) = (
        req.username.filter(|u| !u.is_empty()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    };

    if !validate_credentials(
        &username,
        &password,
        &state.config.admin_username,
        &state.config.admin_password,
    ) {
        tracing::warn!("Rejected admin login");
        return Err(AppError::Unauthorized);
    }

    let token = create_admin_token(&username, &state.config.jwt_signing_key)?;
    tracing::info!("Admin signed in");
    Ok((
        jar.add(admin_cookie(token, state.config.secure_cookies)),
        Json(AdminStatus {
            authenticated: true,
        }),
    ))
}

async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (StatusCode, CookieJar) {
    (
        StatusCode::NO_CONTENT,
        jar.add(clear_admin_cookie(state.config.secure_cookies)),
    )
}

async fn admin_summary(State(state): State<Arc<AppState>>) -> Json<AdminSummary> {
    Json(AdminSummary {
        authenticated: true,
        username: state.config.admin_username.clone(),
        offline: state.config.offline,
    })
}
