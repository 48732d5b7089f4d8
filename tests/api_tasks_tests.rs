// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task and comment routes, end to end over the in-memory backends.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use futures_util::StreamExt;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

mod common;

const UID: &str = "uid000001";

fn request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn create(app: &Router, token: &str, title: &str, priority: &str) -> Value {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/tasks",
            token,
            Some(json!({"title": title, "priority": priority})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_create_and_list_tasks() {
    let (app, _, _) = common::create_test_app();
    let token = common::test_token(UID, "Ada");

    let task = create(&app, &token, "  Buy milk  ", "high").await;
    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["completed"], false);
    assert_eq!(task["userId"], UID);
    assert!(task["id"].as_str().is_some_and(|id| !id.is_empty()));

    let (status, list) = send(&app, request("GET", "/api/tasks", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], task["id"]);
}

#[tokio::test]
async fn test_blank_title_rejected() {
    let (app, _, _) = common::create_test_app();
    let token = common::test_token(UID, "Ada");

    let (status, _) = send(
        &app,
        request("POST", "/api/tasks", &token, Some(json!({"title": "   "}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_sorted_and_filtered() {
    let (app, _, _) = common::create_test_app();
    let token = common::test_token(UID, "Ada");

    create(&app, &token, "low one", "low").await;
    let urgent = create(&app, &token, "urgent one", "urgent").await;
    create(&app, &token, "normal one", "normal").await;

    let (_, list) = send(&app, request("GET", "/api/tasks?sort=priority", &token, None)).await;
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["urgent one", "normal one", "low one"]);

    let uri = format!("/api/tasks/{}/toggle", urgent["id"].as_str().unwrap());
    send(&app, request("POST", &uri, &token, Some(json!({"completed": true})))).await;

    let (_, done) = send(
        &app,
        request("GET", "/api/tasks?filter=completed", &token, None),
    )
    .await;
    assert_eq!(done.as_array().unwrap().len(), 1);
    assert_eq!(done[0]["title"], "urgent one");

    let (_, stats) = send(&app, request("GET", "/api/tasks/stats", &token, None)).await;
    assert_eq!(
        stats,
        json!({"total": 3, "active": 2, "completed": 1, "urgent": 0})
    );
}

#[tokio::test]
async fn test_edit_patch_and_delete_task() {
    let (app, _, _) = common::create_test_app();
    let token = common::test_token(UID, "Ada");
    let task = create(&app, &token, "draft", "normal").await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, edited) = send(
        &app,
        request(
            "PUT",
            &uri,
            &token,
            Some(json!({"title": "final", "description": "done properly", "priority": "urgent"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["title"], "final");
    assert_eq!(edited["priority"], "urgent");
    assert_eq!(edited["createdAt"], task["createdAt"]);

    let (status, patched) = send(
        &app,
        request("PATCH", &uri, &token, Some(json!({"completed": true}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["completed"], true);
    assert_eq!(patched["title"], "final");

    let (status, _) = send(&app, request("DELETE", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, request("GET", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_other_users_task_is_not_found() {
    let (app, _, _) = common::create_test_app();
    let owner = common::test_token(UID, "Ada");
    let other = common::test_token("uid000002", "Bob");
    let task = create(&app, &owner, "private", "normal").await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, _) = send(&app, request("GET", &uri, &other, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let (app, _, _) = common::create_test_app();
    let token = common::test_token(UID, "Ada Lovelace");
    let task = create(&app, &token, "discuss", "normal").await;
    let comments_uri = format!("/api/tasks/{}/comments", task["id"].as_str().unwrap());

    let (status, comment) = send(
        &app,
        request("POST", &comments_uri, &token, Some(json!({"text": "first!"}))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["userName"], "Ada Lovelace");
    assert_eq!(comment["userId"], UID);

    let comment_uri = format!("{}/{}", comments_uri, comment["id"].as_str().unwrap());
    let (status, edited) = send(
        &app,
        request("PUT", &comment_uri, &token, Some(json!({"text": "edited"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["text"], "edited");
    assert!(edited["updatedAt"].is_i64());

    let (status, task) = send(&app, request("DELETE", &comment_uri, &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(task["comments"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, request("DELETE", &comment_uri, &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_responses_not_cached() {
    let (app, _, _) = common::create_test_app();
    let token = common::test_token(UID, "Ada");

    let response = app
        .oneshot(request("GET", "/api/tasks", &token, None))
        .await
        .unwrap();
    assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
}

#[tokio::test]
async fn test_task_stream_sends_current_list() {
    let (app, state, _) = common::create_test_app();
    let token = common::test_token(UID, "Ada");
    state
        .tasks
        .create_task(UID, "streamed", "", todoboard::models::Priority::Normal)
        .await
        .unwrap();

    let response = app
        .oneshot(request("GET", "/api/tasks/stream", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let mut body = response.into_body().into_data_stream();
    let first = tokio::time::timeout(Duration::from_secs(2), body.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let frame = String::from_utf8(first.to_vec()).unwrap();
    assert!(frame.contains("event: tasks"));
    assert!(frame.contains("\"title\":\"streamed\""));
}
