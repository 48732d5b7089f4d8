// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Sign-up and sign-in issue a session cookie that the API accepts
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// `name=value` part of the session cookie set on a response.
fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("todoboard_token="))
        .and_then(|v| v.split(';').next())
        .expect("session cookie set")
        .to_string()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["buildId"].is_string());
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/tasks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Should return 401 Unauthorized without token
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/tasks")
                .header(header::AUTHORIZATION, "Bearer invalid.token.here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_valid_token() {
    let (app, _, _) = common::create_test_app();
    let token = common::test_token("uid000001", "Ada");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/tasks")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_sign_up_sets_cookie_and_profile_is_readable() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            json!({"email": "ada@example.com", "password": "hunter22", "displayName": "Ada"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response);
    let body = common::body_json(response).await;
    assert_eq!(body["displayName"], "Ada");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = common::body_json(response).await;
    assert_eq!(profile["email"], "ada@example.com");
    assert_eq!(profile["displayName"], "Ada");
}

#[tokio::test]
async fn test_sign_up_validation_error() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            json!({"email": "ada@example.com", "password": "123", "displayName": "Ada"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["details"], "Password should be at least 6 characters.");
}

#[tokio::test]
async fn test_sign_in_wrong_password_is_bad_request() {
    let (app, state, _) = common::create_test_app();
    state
        .accounts
        .create_account("ada@example.com", "hunter22", "Ada")
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/signin",
            json!({"email": "ada@example.com", "password": "nope"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["details"], "Firebase: Error (auth/wrong-password).");
}

#[tokio::test]
async fn test_sign_out_clears_cookie() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/signout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cleared.starts_with("todoboard_token="));
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_reset_password_unknown_email() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/reset-password",
            json!({"email": "nobody@example.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["details"], "No account found with this email address.");
}

#[tokio::test]
async fn test_reset_password_success() {
    let (app, state, backends) = common::create_test_app();
    state
        .accounts
        .create_account("ada@example.com", "hunter22", "Ada")
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/reset-password",
            json!({"email": "ada@example.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["success"], true);
    assert_eq!(backends.identity.reset_requests(), vec!["ada@example.com"]);
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/tasks")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/tasks")
                .header(header::ORIGIN, "https://evil.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_cors_rejects_localhost_lookalike() {
    let (app, _, _) = common::create_test_app();

    for origin in [
        "http://localhost.attacker.example",
        "http://127.0.0.1.attacker.example",
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/tasks")
                    .header(header::ORIGIN, origin)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none(),
            "{origin} should not be allowed"
        );
    }
}
