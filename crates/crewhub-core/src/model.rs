//! Domain data model — the entities the notification core reads, and the
//! notification record it writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }

    /// Parse from the stored string form. Unknown values map to Info.
    pub fn parse(s: &str) -> Self {
        match s {
            "warning" => Severity::Warning,
            "success" => Severity::Success,
            "error" => Severity::Error,
            _ => Severity::Info,
        }
    }
}

/// A per-recipient notification record.
/// Immutable after creation except for the `read` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    /// Optional deep-link path, e.g. "/tasks/{id}".
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create an unread notification for one recipient.
    pub fn new(
        recipient_id: &str,
        title: &str,
        message: &str,
        severity: Severity,
        link: Option<&str>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            recipient_id: recipient_id.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            severity,
            link: link.map(|s| s.to_string()),
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "in_progress" => TaskStatus::InProgress,
            "completed" => TaskStatus::Completed,
            _ => TaskStatus::Pending,
        }
    }

    /// Pending or in-progress — the statuses reminder sweeps care about.
    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

/// A task. The multi-assignee set lives in the `task_assignees` join table;
/// `assignee_id` is the optional primary assignee kept alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub creator_id: String,
    pub assignee_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a pending task.
    pub fn new(title: &str, creator_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: None,
            title: title.to_string(),
            description: String::new(),
            due_date: None,
            status: TaskStatus::Pending,
            creator_id: creator_id.to_string(),
            assignee_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub is_online: bool,
    pub online_platform: Option<String>,
    pub location: Option<String>,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Create an in-person event.
    pub fn new(title: &str, start_date: DateTime<Utc>, creator_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: None,
            title: title.to_string(),
            start_date,
            is_online: false,
            online_platform: None,
            location: None,
            creator_id: creator_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// A project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: &str, creator_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            creator_id: creator_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// A user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: None,
            created_at: Utc::now(),
        }
    }
}
