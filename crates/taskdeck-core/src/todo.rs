use crate::id::TodoId;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Duration, OffsetDateTime};

/// Completion state of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    /// Not done yet.
    #[default]
    Open,
    /// Done.
    Complete,
}

impl TodoStatus {
    /// String representation used in snapshots and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Complete => "complete",
        }
    }

    /// The other status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Complete,
            Self::Complete => Self::Open,
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single task record, serialized as one element of the durable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier, immutable.
    pub id: TodoId,
    /// Display title.
    pub title: String,
    /// Free text, empty when unset.
    #[serde(default)]
    pub description: String,
    /// Optional deadline.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    /// Completion state.
    pub status: TodoStatus,
    /// Creation instant, immutable.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Instant of the latest mutation.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Todo {
    /// Build a fresh open todo stamped at `now`.
    #[must_use]
    pub fn create(input: NewTodo, now: OffsetDateTime) -> Self {
        let NewTodo {
            title,
            description,
            due_date,
        } = input;
        Self {
            id: TodoId::new(),
            title,
            description: description.unwrap_or_default(),
            due_date,
            status: TodoStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true when the todo is complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == TodoStatus::Complete
    }

    /// Merge `patch` into the record and refresh `updated_at`.
    pub fn apply(&mut self, patch: TodoPatch, now: OffsetDateTime) {
        let TodoPatch {
            title,
            description,
            due_date,
            status,
        } = patch;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        match due_date {
            Some(DueDatePatch::Set { due }) => self.due_date = Some(due),
            Some(DueDatePatch::Clear) => self.due_date = None,
            None => {}
        }
        if let Some(status) = status {
            self.status = status;
        }
        self.touch(now);
    }

    /// Flip between open and complete.
    pub fn toggle(&mut self, now: OffsetDateTime) {
        self.status = self.status.toggled();
        self.touch(now);
    }

    /// Refresh `updated_at`, keeping it strictly increasing even when the clock stalls.
    pub fn touch(&mut self, now: OffsetDateTime) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}

/// Input accepted when adding a todo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    /// Display title.
    pub title: String,
    /// Optional free text.
    pub description: Option<String>,
    /// Optional deadline.
    pub due_date: Option<OffsetDateTime>,
}

impl NewTodo {
    /// Start from a title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a deadline.
    #[must_use]
    pub const fn with_due_date(mut self, due: OffsetDateTime) -> Self {
        self.due_date = Some(due);
        self
    }
}

/// Patch for the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDatePatch {
    /// Overwrite with a new deadline.
    Set {
        /// New deadline.
        due: OffsetDateTime,
    },
    /// Remove the deadline.
    Clear,
}

/// Field patch for an existing todo. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    /// Overwrite the title.
    pub title: Option<String>,
    /// Overwrite the description (`Some(String::new())` clears it).
    pub description: Option<String>,
    /// Patch applied to the due date.
    pub due_date: Option<DueDatePatch>,
    /// Overwrite the status.
    pub status: Option<TodoStatus>,
}

impl TodoPatch {
    /// Returns true when no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
    }

    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the due date.
    #[must_use]
    pub const fn due(mut self, due: OffsetDateTime) -> Self {
        self.due_date = Some(DueDatePatch::Set { due });
        self
    }

    /// Clear the due date.
    #[must_use]
    pub const fn clear_due(mut self) -> Self {
        self.due_date = Some(DueDatePatch::Clear);
        self
    }

    /// Set the status.
    #[must_use]
    pub const fn status(mut self, status: TodoStatus) -> Self {
        self.status = Some(status);
        self
    }
}
