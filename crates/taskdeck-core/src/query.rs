use std::fmt;

use crate::text_matcher::TextMatcher;
use crate::todo::{Todo, TodoStatus};

/// Status selector applied before text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    /// Keep every status.
    #[default]
    All,
    /// Keep open todos only.
    Open,
    /// Keep complete todos only.
    Complete,
}

impl StatusFilter {
    /// Map a filter tag onto a filter, returning `None` for unknown tags.
    #[must_use]
    pub fn recognize(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "open" => Some(Self::Open),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    /// Tag representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Open => "open",
            Self::Complete => "complete",
        }
    }

    /// Whether a todo with `status` passes the filter.
    #[must_use]
    pub fn admits(self, status: TodoStatus) -> bool {
        match self {
            Self::All => true,
            Self::Open => status == TodoStatus::Open,
            Self::Complete => status == TodoStatus::Complete,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combined status filter and text search producing the display ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQuery {
    /// Status filter.
    pub filter: StatusFilter,
    /// Optional text matcher (blank searches are `None`).
    pub text: Option<TextMatcher>,
}

impl TodoQuery {
    /// Build a query from a filter and raw search input.
    #[must_use]
    pub fn new(filter: StatusFilter, search: &str) -> Self {
        Self {
            filter,
            text: TextMatcher::new(search),
        }
    }

    /// Returns true when every todo passes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filter == StatusFilter::All && self.text.is_none()
    }

    /// Determine whether a single todo passes both filters.
    #[must_use]
    pub fn matches(&self, todo: &Todo) -> bool {
        self.filter.admits(todo.status)
            && self.text.as_ref().is_none_or(|matcher| matcher.matches(todo))
    }

    /// Filter and order `todos` newest first. The input is left untouched.
    #[must_use]
    pub fn run(&self, todos: &[Todo]) -> Vec<Todo> {
        let mut selected: Vec<Todo> = todos
            .iter()
            .filter(|todo| self.matches(todo))
            .cloned()
            .collect();
        sort_newest_first(&mut selected);
        selected
    }
}

/// Stable sort by creation time, newest first. Equal timestamps keep their order.
pub fn sort_newest_first(todos: &mut [Todo]) {
    todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
