//! Core types for the Taskdeck service.
//!
//! Entities serialize with camelCase keys, which is the JSON wire format of
//! the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Color assigned to projects and tags when none is given.
pub const DEFAULT_COLOR: &str = "#000000";

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parse the wire representation. Matching is exact.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Completed,
    Archived,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Todo,
        Status::InProgress,
        Status::Completed,
        Status::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named grouping that tasks may belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub color: String,
}

/// Validated input for creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub slug: String,
    pub color: String,
}

/// Partial project update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub color: Option<String>,
}

/// A named label, many-to-many with tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTag {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// A unit of user work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<i64>,
    /// Manual ordering within a list.
    pub position: i64,
    /// Parent task for subtasks.
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a task.
///
/// Also the shape of a task draft returned by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<i64>,
    pub position: i64,
    pub parent_id: Option<i64>,
}

impl NewTask {
    /// A task with the given title and every other field at its default.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            status: Status::default(),
            due_date: None,
            project_id: None,
            position: 0,
            parent_id: None,
        }
    }
}

/// A task draft produced by the assistant.
pub type TaskDraft = NewTask;

/// Partial task update (PATCH semantics).
///
/// Outer `None` leaves the column untouched; for nullable columns
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub project_id: Option<Option<i64>>,
    pub position: Option<i64>,
    pub parent_id: Option<Option<i64>>,
}

impl TaskPatch {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this patch over an existing task.
    pub fn apply_to(&self, task: &Task) -> Task {
        Task {
            id: task.id,
            title: self.title.clone().unwrap_or_else(|| task.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| task.description.clone()),
            priority: self.priority.unwrap_or(task.priority),
            status: self.status.unwrap_or(task.status),
            due_date: self.due_date.unwrap_or(task.due_date),
            project_id: self.project_id.unwrap_or(task.project_id),
            position: self.position.unwrap_or(task.position),
            parent_id: self.parent_id.unwrap_or(task.parent_id),
            created_at: task.created_at,
        }
    }
}

/// Conjunctive filter for listing tasks. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub project_id: Option<i64>,
    pub status: Option<Status>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(Status::parse("in_progress"), Some(Status::InProgress));
        assert_eq!(Status::parse("in-progress"), None);
        assert_eq!(Priority::parse("HIGH"), None);
        assert_eq!(
            serde_json::to_value(Status::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
    }

    #[test]
    fn test_patch_keeps_omitted_fields() {
        let task = Task {
            id: 7,
            title: "Write report".into(),
            description: Some("quarterly".into()),
            priority: Priority::High,
            status: Status::Todo,
            due_date: None,
            project_id: Some(2),
            position: 3,
            parent_id: None,
            created_at: Utc::now(),
        };
        let patch = TaskPatch {
            status: Some(Status::Completed),
            description: Some(None),
            ..Default::default()
        };

        let merged = patch.apply_to(&task);
        assert_eq!(merged.status, Status::Completed);
        assert_eq!(merged.description, None);
        assert_eq!(merged.title, task.title);
        assert_eq!(merged.project_id, Some(2));
        assert_eq!(merged.created_at, task.created_at);
    }

    #[test]
    fn test_task_serializes_camel_case_with_nulls() {
        let task = Task {
            id: 1,
            title: "Buy milk".into(),
            description: None,
            priority: Priority::Low,
            status: Status::Todo,
            due_date: None,
            project_id: None,
            position: 0,
            parent_id: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("dueDate").unwrap().is_null());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["priority"], "low");
    }
}
