// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: sign-up, sign-in, sign-out and password reset.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{clear_session_cookie, create_jwt, session_cookie};
use crate::models::SessionUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", post(sign_out))
        .route("/auth/reset-password", post(reset_password))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 6, message = "Password should be at least 6 characters."))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Please enter your name."))]
    pub display_name: String,
}

#[derive(Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1, message = "Please enter your email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Please enter your password."))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Please enter your email address."))]
    pub email: String,
}

/// Signed-in user, as returned to the frontend.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl From<&SessionUser> for SessionResponse {
    fn from(user: &SessionUser) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ResetPasswordResponse {
    pub success: bool,
    pub message: String,
}

/// Turn validator output into a single user-facing message.
pub(crate) fn validation_error(errors: validator::ValidationErrors) -> AppError {
    let message = errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .next()
        .unwrap_or_else(|| errors.to_string());
    AppError::BadRequest(message)
}

/// Issue a session token for `user` and attach it as a cookie.
fn start_session(state: &AppState, jar: CookieJar, user: &SessionUser) -> Result<CookieJar> {
    let token = create_jwt(user, &state.config.jwt_signing_key)?;
    Ok(jar.add(session_cookie(token, state.config.secure_cookies)))
}

/// Create an account and sign it in.
async fn sign_up(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>)> {
    req.validate().map_err(validation_error)?;

    let user = state
        .accounts
        .create_account(req.email.trim(), &req.password, req.display_name.trim())
        .await?;

    let jar = start_session(&state, jar, &user)?;
    Ok((StatusCode::CREATED, jar, Json(SessionResponse::from(&user))))
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<SignInRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate().map_err(validation_error)?;

    let user = state.accounts.sign_in(req.email.trim(), &req.password).await?;

    let jar = start_session(&state, jar, &user)?;
    Ok((jar, Json(SessionResponse::from(&user))))
}

/// Clear the session cookie. The cookie is cleared even if the provider
/// sign-out fails.
async fn sign_out(State(state): State<Arc<AppState>>, jar: CookieJar) -> (StatusCode, CookieJar) {
    if let Err(e) = state.accounts.sign_out().await {
        tracing::warn!(error = %e, "Provider sign-out failed; clearing session anyway");
    }
    (
        StatusCode::NO_CONTENT,
        jar.add(clear_session_cookie(state.config.secure_cookies)),
    )
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>> {
    req.validate().map_err(validation_error)?;

    state.accounts.reset_password(req.email.trim()).await?;

    Ok(Json(ResetPasswordResponse {
        success: true,
        message: "Password reset email sent. Check your inbox.".to_string(),
    }))
}
