// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::task::{sort_tasks, TaskFilter, TaskSort, TaskStats};
use crate::models::{Comment, Priority, TaskUpdate, TodoTask, UserProfile};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post, put},
    Extension, Json, Router,
};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::auth::validation_error;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/stats", get(task_stats))
        .route("/api/tasks/stream", get(stream_tasks))
        .route(
            "/api/tasks/{task_id}",
            get(get_task)
                .put(edit_task)
                .patch(update_task)
                .delete(delete_task),
        )
        .route("/api/tasks/{task_id}/toggle", post(toggle_task))
        .route("/api/tasks/{task_id}/comments", post(add_comment))
        .route(
            "/api/tasks/{task_id}/comments/{comment_id}",
            put(edit_comment).delete(delete_comment),
        )
}

// ─── User Profile ────────────────────────────────────────────

/// Get the signed-in user's stored profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .accounts
        .get_user_profile(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.uid)))?;

    Ok(Json(profile))
}

// ─── Tasks ───────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct ListQuery {
    #[serde(default)]
    sort: TaskSort,
    #[serde(default)]
    filter: TaskFilter,
}

/// Request body for creating or editing a task.
#[derive(Deserialize, Validate)]
pub struct TaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title is required."))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

impl TaskRequest {
    fn trimmed_title(&self) -> Result<&str> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title is required.".to_string()));
        }
        Ok(title)
    }
}

#[derive(Deserialize)]
struct ToggleRequest {
    completed: bool,
}

#[derive(Deserialize, Validate)]
struct CommentRequest {
    #[validate(length(min = 1, max = 5000, message = "Comment cannot be empty."))]
    text: String,
}

impl CommentRequest {
    fn trimmed_text(&self) -> Result<&str> {
        self.validate().map_err(validation_error)?;
        let text = self.text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("Comment cannot be empty.".to_string()));
        }
        Ok(text)
    }
}

/// List tasks, filtered and sorted for display.
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<TodoTask>>> {
    let mut tasks: Vec<TodoTask> = state
        .tasks
        .get_user_tasks(&user.uid)
        .await?
        .into_iter()
        .filter(|t| params.filter.matches(t))
        .collect();
    sort_tasks(&mut tasks, params.sort);

    Ok(Json(tasks))
}

async fn task_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TaskStats>> {
    let tasks = state.tasks.get_user_tasks(&user.uid).await?;
    Ok(Json(TaskStats::from_tasks(&tasks)))
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<TaskRequest>,
) -> Result<(StatusCode, Json<TodoTask>)> {
    req.validate().map_err(validation_error)?;
    let title = req.trimmed_title()?;

    let task_id = state
        .tasks
        .create_task(&user.uid, title, req.description.trim(), req.priority)
        .await?;
    let task = state.tasks.get_task(&user.uid, &task_id).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
) -> Result<Json<TodoTask>> {
    Ok(Json(state.tasks.get_task(&user.uid, &task_id).await?))
}

/// Replace title, description and priority.
async fn edit_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
    Json(req): Json<TaskRequest>,
) -> Result<Json<TodoTask>> {
    req.validate().map_err(validation_error)?;
    let title = req.trimmed_title()?;

    let task = state
        .tasks
        .edit_task(&user.uid, &task_id, title, req.description.trim(), req.priority)
        .await?;
    Ok(Json(task))
}

/// Apply a partial update.
async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
    Json(mut update): Json<TaskUpdate>,
) -> Result<Json<TodoTask>> {
    if let Some(title) = update.title.as_mut() {
        *title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title is required.".to_string()));
        }
    }

    let task = state.tasks.update_task(&user.uid, &task_id, &update).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
) -> Result<StatusCode> {
    state.tasks.delete_task(&user.uid, &task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<TodoTask>> {
    let task = state
        .tasks
        .toggle_task_completion(&user.uid, &task_id, req.completed)
        .await?;
    Ok(Json(task))
}

// ─── Comments ────────────────────────────────────────────────

/// Add a comment authored by the signed-in user.
async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let text = req.trimmed_text()?;
    let comment = state
        .tasks
        .add_comment(&user.uid, &task_id, text, &user.name)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn edit_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((task_id, comment_id)): Path<(String, String)>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<Comment>> {
    let text = req.trimmed_text()?;
    let comment = state
        .tasks
        .edit_comment(&user.uid, &task_id, &comment_id, text)
        .await?;
    Ok(Json(comment))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((task_id, comment_id)): Path<(String, String)>,
) -> Result<Json<TodoTask>> {
    let task = state
        .tasks
        .delete_comment(&user.uid, &task_id, &comment_id)
        .await?;
    Ok(Json(task))
}

// ─── Live Updates ────────────────────────────────────────────

/// Server-sent events carrying the full task list, sent once on connect and
/// again after every change. The subscription ends when the client goes away.
async fn stream_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    let updates = state.tasks.watch_user_tasks(&user.uid).await?;
    tracing::debug!(uid = %user.uid, "Task stream opened");

    let events = updates.map(|tasks| Event::default().event("tasks").json_data(tasks));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
