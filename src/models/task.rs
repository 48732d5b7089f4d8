// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Todo task and comment models.
//!
//! Tasks live at `tasks/{userId}/{taskId}`. The task ID is the database key
//! and is not stored inside the record itself; it is attached on decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Task priority label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Normal => "Normal",
            Priority::Low => "Low",
        }
    }

    /// Display rank; higher sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 4,
            Priority::High => 3,
            Priority::Normal => 2,
            Priority::Low => 1,
        }
    }
}

/// Comment embedded in a task's comment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Comment {
    /// Creation time in milliseconds, as a string. Not unique under
    /// concurrent writes.
    pub id: String,
    pub text: String,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Author's user ID
    pub user_id: String,
    /// Author's display name at the time of writing
    pub user_name: String,
}

/// A user's todo task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TodoTask {
    /// Database key (not stored in the record)
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
    /// Owning user's ID
    pub user_id: String,
    /// The database drops empty arrays, so a missing list means no comments.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl TodoTask {
    /// Decode a single task record read from `tasks/{userId}/{id}`.
    pub fn from_record(id: &str, value: Value) -> Result<Self, serde_json::Error> {
        let mut task: TodoTask = serde_json::from_value(value)?;
        task.id = id.to_string();
        Ok(task)
    }

    /// Encode as a stored record, without the `id` key.
    pub fn to_record(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("id");
        }
        Ok(value)
    }

    /// Decode a whole `tasks/{userId}` subtree.
    ///
    /// Records that fail to decode are skipped with a warning. Keys come back
    /// in sorted order, which for push keys is creation order.
    pub fn list_from_snapshot(snapshot: Option<Value>) -> Vec<TodoTask> {
        let Some(Value::Object(records)) = snapshot else {
            return Vec::new();
        };

        records
            .into_iter()
            .filter_map(|(id, value)| match TodoTask::from_record(&id, value) {
                Ok(task) => Some(task),
                Err(e) => {
                    tracing::warn!(task_id = %id, error = %e, "Skipping undecodable task record");
                    None
                }
            })
            .collect()
    }
}

/// Partial task update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    /// Apply the set fields to `task`. Does not touch timestamps.
    pub fn apply_to(&self, task: &mut TodoTask) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

// ─── Listing helpers ─────────────────────────────────────────

/// Sort order for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskSort {
    /// Highest priority first, newest first within a priority
    #[default]
    Priority,
    /// Newest first
    Date,
    /// Title, case-insensitive
    Alphabetical,
}

/// Completion filter for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &TodoTask) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }
}

/// Sort tasks in place for display.
pub fn sort_tasks(tasks: &mut [TodoTask], sort: TaskSort) {
    match sort {
        TaskSort::Priority => tasks.sort_by(|a, b| {
            b.priority
                .rank()
                .cmp(&a.priority.rank())
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
        TaskSort::Date => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        TaskSort::Alphabetical => tasks.sort_by(|a, b| {
            match a.title.to_lowercase().cmp(&b.title.to_lowercase()) {
                Ordering::Equal => a.title.cmp(&b.title),
                other => other,
            }
        }),
    }
}

/// Counts shown above the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TaskStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    /// Urgent tasks that are not yet completed
    pub urgent: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[TodoTask]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total: tasks.len(),
            active: tasks.len() - completed,
            completed,
            urgent: tasks
                .iter()
                .filter(|t| t.priority == Priority::Urgent && !t.completed)
                .count(),
        }
    }
}
