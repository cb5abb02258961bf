//! Task record model.
//!
//! Tasks are owned by the caller; the query engine only ever reads them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A task-like record that queries run against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier. This is the key used for dependency lookups.
    pub id: String,

    /// Display text of the task.
    #[serde(default)]
    pub description: String,

    /// Workflow status.
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority level.
    #[serde(default)]
    pub priority: Priority,

    /// Due date (`YYYY-MM-DD`, optionally followed by a time part).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,

    /// Scheduled date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<String>,

    /// Start date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    /// Creation date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// Completion date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<String>,

    /// Tags attached to the task, conventionally `#`-prefixed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Path of the document the task lives in.
    #[serde(default)]
    pub path: String,

    /// Reference other tasks use in `depends_on` to point at this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_id: Option<String>,

    /// References (`dependency_id` or `id`) of tasks this one waits on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Recurrence rule text, uninterpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,

    /// Any other properties, reachable by name or dotted path.
    #[serde(default, flatten)]
    pub properties: Map<String, Value>,
}

impl Task {
    /// Creates a task with the given id and description and defaults elsewhere.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: TaskStatus::default(),
            priority: Priority::default(),
            due: None,
            scheduled: None,
            start: None,
            created: None,
            done: None,
            tags: Vec::new(),
            path: String::new(),
            dependency_id: None,
            depends_on: Vec::new(),
            recurrence: None,
            properties: Map::new(),
        }
    }

    /// Returns true if the task is done or cancelled.
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    /// Returns the lowercase name used in queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Done and cancelled tasks no longer block anything.
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority level of a task.
///
/// `None` is an explicit level; its sort rank comes from the vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Highest,
    High,
    Medium,
    #[default]
    None,
    Low,
    Lowest,
}

impl Priority {
    /// Returns the lowercase name used in queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Highest => "highest",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Lowest => "lowest",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
