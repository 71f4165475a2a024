//! Task domain model.
//!
//! A task is a short piece of text owned by exactly one user. Ownership is
//! fixed at creation time and is never taken from client input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Store-generated identifier for a task.
///
/// Serialized as a plain JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Creates a `TaskId` from a raw integer.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identity of the user owning a task.
///
/// The value is opaque: it is whatever the session verifier reports.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates an `OwnerId` from a string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub const fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.to_rfc3339())
    }
}

// =============================================================================
// Task
// =============================================================================

/// The sole durable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-generated identifier, immutable.
    pub id: TaskId,
    /// Non-empty task text.
    pub title: String,
    /// Optional longer note.
    pub description: Option<String>,
    /// Completion flag, `false` at creation.
    pub completed: bool,
    /// Owner fixed at creation from the authenticated caller.
    pub owner_id: OwnerId,
    /// Creation time; the listing sort key.
    pub created_at: Timestamp,
}

impl Task {
    /// Creates a new, not yet completed task.
    #[must_use]
    pub fn new(
        id: TaskId,
        owner_id: OwnerId,
        title: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            completed: false,
            owner_id,
            created_at,
        }
    }

    /// Returns a new task with the given description.
    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    /// Returns a new task with the completed flag set to the given value.
    #[must_use]
    pub fn with_completed(self, completed: bool) -> Self {
        Self { completed, ..self }
    }

    /// Returns a new task with the completed flag inverted.
    #[must_use]
    pub fn toggled(self) -> Self {
        let completed = !self.completed;
        self.with_completed(completed)
    }

    /// Applies a partial update. Absent fields are left untouched.
    #[must_use]
    pub fn apply(self, patch: &TaskPatch) -> Self {
        Self {
            title: patch.title.clone().unwrap_or(self.title),
            description: patch.description.clone().unwrap_or(self.description),
            completed: patch.completed.unwrap_or(self.completed),
            ..self
        }
    }

    /// Returns `true` if this task is owned by `owner`.
    #[must_use]
    pub fn is_owned_by(&self, owner: &OwnerId) -> bool {
        &self.owner_id == owner
    }
}

/// Newest first: `created_at` descending, ties broken by `id` descending.
#[must_use]
pub fn newest_first(left: &Task, right: &Task) -> std::cmp::Ordering {
    right
        .created_at
        .cmp(&left.created_at)
        .then_with(|| right.id.cmp(&left.id))
}

/// Validated input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Trimmed, non-empty title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
}

impl NewTask {
    /// Creates validated creation input.
    #[must_use]
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
        }
    }
}

/// Partial update of the mutable task fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New description. `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// New completion flag.
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Completion-state filter used when displaying a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Every task.
    #[default]
    All,
    /// Tasks not yet completed.
    Active,
    /// Completed tasks.
    Completed,
}

impl StatusFilter {
    /// Returns `true` if a task with the given completion flag passes.
    #[must_use]
    pub const fn accepts(self, completed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Active => !completed,
            Self::Completed => completed,
        }
    }
}

/// Combined status and title-search filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Completion-state filter.
    pub status: StatusFilter,
    /// Lowercased search text; empty matches everything.
    query: String,
}

impl TaskFilter {
    /// Creates a filter. The query is matched case-insensitively.
    #[must_use]
    pub fn new(status: StatusFilter, query: &str) -> Self {
        Self {
            status,
            query: query.trim().to_lowercase(),
        }
    }

    /// Returns the normalized search text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns `true` if a title and completion flag pass both filters.
    #[must_use]
    pub fn accepts(&self, title: &str, completed: bool) -> bool {
        self.status.accepts(completed)
            && (self.query.is_empty() || title.to_lowercase().contains(&self.query))
    }

    /// Returns `true` if the task passes both the status and the search filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.accepts(&task.title, task.completed)
    }

    /// Keeps the matching tasks, preserving order.
    #[must_use]
    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        tasks.into_iter().filter(|task| self.matches(task)).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
