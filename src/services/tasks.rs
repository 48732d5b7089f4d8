// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user todo tasks and their comment threads.
//!
//! Tasks are stored at `tasks/{userId}/{taskId}` with comments embedded in
//! the task record. Every mutation reads the whole task, changes it in
//! memory and writes the whole task back. There is no concurrency token, so
//! two overlapping writers can lose one of their updates (last write wins).

use crate::db::{paths, RealtimeDatabase, StoreError, Subscription};
use crate::models::{Comment, Priority, TaskUpdate, TodoTask};
use crate::time_utils::{now_millis, stamp_after};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::Arc;

/// Stream of full task lists, one per change.
pub type TaskStream = BoxStream<'static, Vec<TodoTask>>;

/// Task store scoped by caller-supplied user IDs.
#[derive(Clone)]
pub struct TaskStore {
    db: Arc<dyn RealtimeDatabase>,
}

impl TaskStore {
    pub fn new(db: Arc<dyn RealtimeDatabase>) -> Self {
        Self { db }
    }

    // ─── Task Operations ─────────────────────────────────────────

    /// Create a task and return its generated ID.
    pub async fn create_task(
        &self,
        user_id: &str,
        title: &str,
        description: &str,
        priority: Priority,
    ) -> Result<String, StoreError> {
        let path = paths::user_tasks(user_id)?;
        let now = now_millis();
        let task = TodoTask {
            id: String::new(),
            title: title.to_string(),
            description: Some(description.to_string()),
            priority,
            completed: false,
            created_at: now,
            updated_at: now,
            user_id: user_id.to_string(),
            comments: Vec::new(),
        };

        let task_id = self
            .db
            .push(&path, &task.to_record()?)
            .await
            .inspect_err(|e| tracing::error!(user_id, error = %e, "Error creating task"))?;

        tracing::info!(user_id, task_id = %task_id, "Task created");
        Ok(task_id)
    }

    /// All of a user's tasks, in creation order. No tasks is an empty list.
    pub async fn get_user_tasks(&self, user_id: &str) -> Result<Vec<TodoTask>, StoreError> {
        let path = paths::user_tasks(user_id)?;
        let snapshot = self
            .db
            .read(&path)
            .await
            .inspect_err(|e| tracing::error!(user_id, error = %e, "Error getting tasks"))?;

        Ok(TodoTask::list_from_snapshot(snapshot))
    }

    /// A single task.
    pub async fn get_task(&self, user_id: &str, task_id: &str) -> Result<TodoTask, StoreError> {
        let path = paths::task(user_id, task_id)?;
        match self.db.read(&path).await? {
            Some(value) => Ok(TodoTask::from_record(task_id, value)?),
            None => Err(StoreError::NotFound(format!("task {}", task_id))),
        }
    }

    /// Apply a partial update.
    pub async fn update_task(
        &self,
        user_id: &str,
        task_id: &str,
        update: &TaskUpdate,
    ) -> Result<TodoTask, StoreError> {
        let (task, ()) = self
            .modify_task(user_id, task_id, "update", |task| {
                update.apply_to(task);
                Ok(())
            })
            .await?;
        Ok(task)
    }

    /// Set the completion flag. Writes (and advances `updatedAt`) even when
    /// the flag already has that value.
    pub async fn toggle_task_completion(
        &self,
        user_id: &str,
        task_id: &str,
        completed: bool,
    ) -> Result<TodoTask, StoreError> {
        let (task, ()) = self
            .modify_task(user_id, task_id, "toggle", |task| {
                task.completed = completed;
                Ok(())
            })
            .await?;
        Ok(task)
    }

    /// Replace title, description and priority.
    pub async fn edit_task(
        &self,
        user_id: &str,
        task_id: &str,
        title: &str,
        description: &str,
        priority: Priority,
    ) -> Result<TodoTask, StoreError> {
        let (task, ()) = self
            .modify_task(user_id, task_id, "edit", |task| {
                task.title = title.to_string();
                task.description = Some(description.to_string());
                task.priority = priority;
                Ok(())
            })
            .await?;
        Ok(task)
    }

    /// Delete a task together with its comments.
    pub async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<(), StoreError> {
        let path = paths::task(user_id, task_id)?;
        self.db.remove(&path).await.inspect_err(
            |e| tracing::error!(user_id, task_id, error = %e, "Error deleting task"),
        )?;

        tracing::info!(user_id, task_id, "Task deleted");
        Ok(())
    }

    // ─── Comment Operations ──────────────────────────────────────

    /// Append a comment. Its ID is its creation time in milliseconds, kept
    /// later than every comment already on the task so IDs stay unique
    /// within the task.
    pub async fn add_comment(
        &self,
        user_id: &str,
        task_id: &str,
        text: &str,
        user_name: &str,
    ) -> Result<Comment, StoreError> {
        let (_, comment) = self
            .modify_task(user_id, task_id, "add_comment", |task| {
                let now = match task.comments.iter().map(|c| c.created_at).max() {
                    Some(latest) => stamp_after(latest),
                    None => now_millis(),
                };
                let comment = Comment {
                    id: now.to_string(),
                    text: text.to_string(),
                    created_at: now,
                    updated_at: None,
                    user_id: user_id.to_string(),
                    user_name: user_name.to_string(),
                };
                task.comments.push(comment.clone());
                Ok(comment)
            })
            .await?;
        Ok(comment)
    }

    /// Replace a comment's text. An unknown comment ID is `NotFound` and
    /// nothing is written.
    pub async fn edit_comment(
        &self,
        user_id: &str,
        task_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<Comment, StoreError> {
        let (_, comment) = self
            .modify_task(user_id, task_id, "edit_comment", |task| {
                let comment = task
                    .comments
                    .iter_mut()
                    .find(|c| c.id == comment_id)
                    .ok_or_else(|| StoreError::NotFound(format!("comment {}", comment_id)))?;
                comment.text = text.to_string();
                comment.updated_at = Some(stamp_after(
                    comment.updated_at.unwrap_or(comment.created_at),
                ));
                Ok(comment.clone())
            })
            .await?;
        Ok(comment)
    }

    /// Remove a comment. An unknown comment ID is `NotFound` and nothing is
    /// written.
    pub async fn delete_comment(
        &self,
        user_id: &str,
        task_id: &str,
        comment_id: &str,
    ) -> Result<TodoTask, StoreError> {
        let (task, ()) = self
            .modify_task(user_id, task_id, "delete_comment", |task| {
                let before = task.comments.len();
                task.comments.retain(|c| c.id != comment_id);
                if task.comments.len() == before {
                    return Err(StoreError::NotFound(format!("comment {}", comment_id)));
                }
                Ok(())
            })
            .await?;
        Ok(task)
    }

    // ─── Live Updates ────────────────────────────────────────────

    /// Stream of the user's full task list: the current list first, then
    /// one list per change. Dropping the stream ends the subscription.
    pub async fn watch_user_tasks(&self, user_id: &str) -> Result<TaskStream, StoreError> {
        let path = paths::user_tasks(user_id)?;
        let snapshots = self.db.subscribe(&path).await.inspect_err(
            |e| tracing::error!(user_id, error = %e, "Error subscribing to tasks"),
        )?;

        let user_id = user_id.to_string();
        Ok(snapshots
            .filter_map(move |snapshot| {
                let tasks = match snapshot {
                    Ok(snapshot) => Some(TodoTask::list_from_snapshot(snapshot)),
                    Err(e) => {
                        tracing::warn!(user_id = %user_id, error = %e, "Task subscription error");
                        None
                    }
                };
                futures_util::future::ready(tasks)
            })
            .boxed())
    }

    /// Call `on_update` with the full task list now and after every change,
    /// until the returned [`Subscription`] is dropped or unsubscribed.
    pub async fn listen_to_user_tasks<F>(
        &self,
        user_id: &str,
        mut on_update: F,
    ) -> Result<Subscription, StoreError>
    where
        F: FnMut(Vec<TodoTask>) + Send + 'static,
    {
        let mut tasks = self.watch_user_tasks(user_id).await?;
        let path = paths::user_tasks(user_id)?;

        let handle = tokio::spawn(async move {
            while let Some(list) = tasks.next().await {
                on_update(list);
            }
        });

        tracing::debug!(user_id, "Listening to task updates");
        Ok(Subscription::new(path, handle))
    }

    // ─── Helpers ─────────────────────────────────────────────────

    /// Read a task, let `change` modify it, stamp `updatedAt` and write the
    /// whole record back. If `change` fails nothing is written.
    async fn modify_task<T, F>(
        &self,
        user_id: &str,
        task_id: &str,
        op: &'static str,
        change: F,
    ) -> Result<(TodoTask, T), StoreError>
    where
        T: Send,
        F: FnOnce(&mut TodoTask) -> Result<T, StoreError> + Send,
    {
        let result = async {
            let path = paths::task(user_id, task_id)?;
            let mut task = self.get_task(user_id, task_id).await?;

            let out = change(&mut task)?;
            task.updated_at = stamp_after(task.updated_at);

            self.db.write(&path, &task.to_record()?).await?;
            Ok::<_, StoreError>((task, out))
        }
        .await;

        match &result {
            Ok(_) => tracing::info!(user_id, task_id, op, "Task modified"),
            Err(StoreError::NotFound(what)) => {
                tracing::warn!(user_id, task_id, op, missing = %what, "Task modify target not found")
            }
            Err(e) => tracing::error!(user_id, task_id, op, error = %e, "Error modifying task"),
        }
        result
    }
}
