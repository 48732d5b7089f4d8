// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin area gate.
//!
//! Admin login checks the configured username/password and sets the
//! `admin-auth` cookie to an HS256 token with an `admin` claim, signed with
//! the session key. Every `/admin` route except the login endpoint requires
//! a token that verifies and redirects to `/admin/login` without it.

use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const ADMIN_COOKIE: &str = "admin-auth";
/// Admin session lifetime: 24 hours.
const ADMIN_TTL_SECS: i64 = 60 * 60 * 24;

pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

/// Claims of the signed admin token carried in the admin cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin username
    pub sub: String,
    /// Always true; separates admin tokens from user session tokens
    pub admin: bool,
    pub iat: usize,
    pub exp: usize,
}

/// Sign an admin token for `username`, valid for 24 hours.
pub fn create_admin_token(username: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;
    let claims = AdminClaims {
        sub: username.to_string(),
        admin: true,
        iat: now,
        exp: now + ADMIN_TTL_SECS as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Decode an admin token. User session tokens are rejected.
pub fn verify_admin_token(
    token: &str,
    signing_key: &[u8],
) -> jsonwebtoken::errors::Result<AdminClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    let claims = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(signing_key),
        &validation,
    )?
    .claims;
    if !claims.admin {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(claims)
}

/// True when the request carries a valid signed admin token.
pub fn is_admin(jar: &CookieJar, signing_key: &[u8]) -> bool {
    jar.get(ADMIN_COOKIE)
        .is_some_and(|c| verify_admin_token(c.value(), signing_key).is_ok())
}

/// Compare submitted credentials against the configured ones in constant time.
pub fn validate_credentials(
    username: &str,
    password: &str,
    expected_username: &str,
    expected_password: &str,
) -> bool {
    let user_ok = username.as_bytes().ct_eq(expected_username.as_bytes());
    let pass_ok = password.as_bytes().ct_eq(expected_password.as_bytes());
    bool::from(user_ok & pass_ok)
}

/// Cookie carrying a signed admin token.
pub fn admin_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((ADMIN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(super::auth::time_max_age(ADMIN_TTL_SECS))
        .build()
}

/// Removal cookie for [`admin_cookie`].
pub fn clear_admin_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = admin_cookie(String::new(), secure);
    cookie.make_removal();
    cookie
}

/// Middleware for the admin area.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() == ADMIN_LOGIN_PATH
        || is_admin(&jar, &state.config.jwt_signing_key)
    {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "Unauthenticated admin request");
    Redirect::to(ADMIN_LOGIN_PATH).into_response()
}
