use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

use crate::due::DueStatus;
use crate::todo::{Todo, TodoStatus};

/// Number of completions shown in the recent-activity list by default.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Completion statistics over the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TodoStats {
    /// Number of todos.
    pub total: usize,
    /// Number of complete todos.
    pub completed: usize,
    /// Number of open todos.
    pub open: usize,
    /// Open todos whose deadline has passed.
    pub overdue: usize,
    /// Rounded completion percentage (0 for an empty collection).
    pub completion_rate: u8,
}

impl TodoStats {
    /// Compute statistics; `now` drives the overdue count.
    #[must_use]
    pub fn from_todos(todos: &[Todo], now: OffsetDateTime) -> Self {
        let total = todos.len();
        let completed = todos
            .iter()
            .filter(|todo| todo.status == TodoStatus::Complete)
            .count();
        let overdue = todos
            .iter()
            .filter(|todo| todo.status == TodoStatus::Open)
            .filter_map(|todo| todo.due_date)
            .filter(|due| DueStatus::classify(*due, now).is_overdue())
            .count();

        Self {
            total,
            completed,
            open: total - completed,
            overdue,
            completion_rate: completion_rate(completed, total),
        }
    }

    /// Bucket the completion rate.
    #[must_use]
    pub const fn tier(&self) -> ProgressTier {
        ProgressTier::from_rate(self.completion_rate)
    }
}

fn completion_rate(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    // Round half up in integer arithmetic: (200c + t) / 2t.
    let rate = (completed * 200 + total) / (total * 2);
    u8::try_from(rate).unwrap_or(100)
}

/// Coarse rating of the completion rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTier {
    /// 80% and above.
    Excellent,
    /// 60% to 79%.
    Good,
    /// 40% to 59%.
    Fair,
    /// Below 40%.
    Low,
}

impl ProgressTier {
    /// Classify a percentage.
    #[must_use]
    pub const fn from_rate(rate: u8) -> Self {
        match rate {
            80.. => Self::Excellent,
            60..=79 => Self::Good,
            40..=59 => Self::Fair,
            _ => Self::Low,
        }
    }

    /// Lowercase tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for ProgressTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completed todos, capped at `limit`.
///
/// Ordered by `updated_at` descending so the latest completions come first,
/// not by position in the collection.
#[must_use]
pub fn recent_completions(todos: &[Todo], limit: usize) -> Vec<&Todo> {
    let mut completed: Vec<&Todo> = todos.iter().filter(|todo| todo.is_complete()).collect();
    completed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    completed.truncate(limit);
    completed
}
