//! Domain types and pure query logic for taskdeck.

/// Time sources.
pub mod clock;
/// Due-date urgency classification.
pub mod due;
/// Identifier types.
pub mod id;
/// Status filter and combined query.
pub mod query;
/// Session records.
pub mod session;
pub mod snapshot;
/// Completion statistics.
pub mod stats;
/// Free-text matching.
pub mod text_matcher;
/// The todo record and its patches.
pub mod todo;

pub use clock::{Clock, ManualClock, SystemClock};
pub use due::DueStatus;
pub use id::TodoId;
pub use query::{StatusFilter, TodoQuery, sort_newest_first};
pub use session::{ProfilePatch, Provider, Session};
pub use stats::{DEFAULT_RECENT_LIMIT, ProgressTier, TodoStats, recent_completions};
pub use text_matcher::TextMatcher;
pub use todo::{DueDatePatch, NewTodo, Todo, TodoPatch, TodoStatus};
