//! Owned todo collection with write-through persistence.
//!
//! Every mutation updates the in-memory collection first and then awaits a write of
//! the whole collection. Storage failures never reach the caller: they are logged,
//! reported to the telemetry sink and surfaced through [`TodoStore::fault`]. The
//! in-memory collection stays authoritative and is never rolled back.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use taskdeck_core::snapshot::{self, DecodedSnapshot};
use taskdeck_core::{
    Clock, NewTodo, StatusFilter, SystemClock, Todo, TodoId, TodoPatch, TodoQuery, TodoStats,
    recent_completions,
};
use tracing::{debug, error, info, warn};

use crate::async_store::AsyncKeyValueStore;
use crate::telemetry::{NoopTelemetry, TelemetrySink};

/// Default storage key of the collection.
pub const DEFAULT_TODOS_KEY: &str = "todos";

const BREADCRUMB_CATEGORY: &str = "todo";

/// Recovered storage failure recorded on the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    /// The durable snapshot could not be read or parsed.
    LoadFailed,
    /// The durable snapshot could not be written.
    SaveFailed,
}

impl fmt::Display for StoreFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFailed => f.write_str("Failed to load todos"),
            Self::SaveFailed => f.write_str("Failed to save todos"),
        }
    }
}

/// Owner of the todo collection and the current filter/search state.
pub struct TodoStore<S> {
    store: S,
    key: String,
    clock: Arc<dyn Clock>,
    telemetry: Arc<dyn TelemetrySink>,
    todos: Vec<Todo>,
    filter: StatusFilter,
    search_query: String,
    fault: Option<StoreFault>,
}

impl<S> TodoStore<S> {
    /// Create an empty store persisting under [`DEFAULT_TODOS_KEY`].
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: DEFAULT_TODOS_KEY.to_owned(),
            clock: Arc::new(SystemClock),
            telemetry: Arc::new(NoopTelemetry),
            todos: Vec::new(),
            filter: StatusFilter::All,
            search_query: String::new(),
            fault: None,
        }
    }

    /// Persist under a different key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Use a different time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Report faults and activity to `telemetry`.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Raw collection in insertion order.
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    /// Look up a todo by id.
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| &todo.id == id)
    }

    /// Number of todos.
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Returns true when the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Current status filter.
    pub const fn filter(&self) -> StatusFilter {
        self.filter
    }

    /// Current raw search input.
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Latest recovered storage failure, if any.
    pub const fn fault(&self) -> Option<StoreFault> {
        self.fault
    }

    /// Forget the recorded storage failure.
    pub fn clear_error(&mut self) {
        self.fault = None;
    }

    /// Select the status filter from a tag. Unknown tags select everything.
    pub fn set_filter(&mut self, value: &str) {
        self.filter = StatusFilter::recognize(value).unwrap_or_else(|| {
            warn!(filter = %value, "Unknown filter, showing all todos");
            StatusFilter::All
        });
    }

    /// Replace the search input.
    pub fn set_search_query(&mut self, value: impl Into<String>) {
        self.search_query = value.into();
    }

    /// Query built from the current filter and search input.
    pub fn current_query(&self) -> TodoQuery {
        TodoQuery::new(self.filter, &self.search_query)
    }

    /// Returns true when the filter or search can hide todos.
    pub fn is_narrowed(&self) -> bool {
        !self.current_query().is_empty()
    }

    /// Filtered, searched and ordered view of the collection, newest first.
    pub fn query(&self) -> Vec<Todo> {
        self.current_query().run(&self.todos)
    }

    /// Completion statistics as of now.
    pub fn stats(&self) -> TodoStats {
        TodoStats::from_todos(&self.todos, self.clock.now())
    }

    /// Most recently completed todos.
    pub fn recent_completions(&self, limit: usize) -> Vec<&Todo> {
        recent_completions(&self.todos, limit)
    }

    fn breadcrumb(&self, message: &str, data: &Value) {
        self.telemetry.add_breadcrumb(message, BREADCRUMB_CATEGORY, data);
    }

    fn position(&self, id: &TodoId) -> Option<usize> {
        self.todos.iter().position(|todo| &todo.id == id)
    }
}

impl<S> TodoStore<S>
where
    S: AsyncKeyValueStore,
{
    /// Replace the collection with the durable snapshot, if one exists.
    ///
    /// Read or parse failures leave the collection untouched and record
    /// [`StoreFault::LoadFailed`].
    pub async fn load(&mut self) {
        self.fault = None;
        match self.read_snapshot().await {
            Ok(Some(DecodedSnapshot {
                todos,
                duplicates,
                clamped,
            })) => {
                if !duplicates.is_empty() {
                    warn!(key = %self.key, count = duplicates.len(), "Dropped duplicate todo ids");
                    self.telemetry.log_warning(
                        "Dropped duplicate todo ids from snapshot",
                        &json!({ "ids": duplicates }),
                    );
                }
                if !clamped.is_empty() {
                    warn!(key = %self.key, count = clamped.len(), "Raised updatedAt to createdAt");
                    self.telemetry.log_warning(
                        "Todos updated before they were created",
                        &json!({ "ids": clamped }),
                    );
                }
                info!(key = %self.key, count = todos.len(), "Loaded todos");
                self.todos = todos;
            }
            Ok(None) => debug!(key = %self.key, "No todo snapshot stored"),
            Err(err) => {
                error!(key = %self.key, error = %format!("{err:#}"), "Error loading todos");
                self.telemetry
                    .log_error(err.as_ref(), &json!({ "operation": "load", "key": self.key }));
                self.fault = Some(StoreFault::LoadFailed);
            }
        }
    }

    /// Append a new open todo and persist.
    pub async fn add(&mut self, input: NewTodo) -> Todo {
        let todo = Todo::create(input, self.clock.now());
        self.todos.push(todo.clone());
        self.breadcrumb("Todo added", &json!({ "id": todo.id }));
        self.persist().await;
        todo
    }

    /// Merge `patch` into the matching todo and persist.
    ///
    /// Unknown ids leave the collection unchanged and return `None`.
    pub async fn update(&mut self, id: &TodoId, patch: TodoPatch) -> Option<Todo> {
        let now = self.clock.now();
        let updated = self.todos.iter_mut().find(|todo| &todo.id == id).map(|todo| {
            todo.apply(patch, now);
            todo.clone()
        });
        self.after_mutation("Todo updated", id, updated.is_some());
        self.persist().await;
        updated
    }

    /// Flip the matching todo between open and complete and persist.
    pub async fn toggle_status(&mut self, id: &TodoId) -> Option<Todo> {
        let now = self.clock.now();
        let toggled = self.todos.iter_mut().find(|todo| &todo.id == id).map(|todo| {
            todo.toggle(now);
            todo.clone()
        });
        self.after_mutation("Todo toggled", id, toggled.is_some());
        self.persist().await;
        toggled
    }

    /// Remove the matching todo and persist the remaining collection.
    pub async fn delete(&mut self, id: &TodoId) -> Option<Todo> {
        let removed = self.position(id).map(|idx| self.todos.remove(idx));
        self.after_mutation("Todo deleted", id, removed.is_some());
        self.persist().await;
        removed
    }

    fn after_mutation(&self, message: &str, id: &TodoId, found: bool) {
        if found {
            self.breadcrumb(message, &json!({ "id": id }));
        } else {
            debug!(%id, "{message}: no such todo");
        }
    }

    async fn read_snapshot(&self) -> Result<Option<DecodedSnapshot>> {
        let Some(raw) = self.store.get(&self.key).await.map_err(Into::<anyhow::Error>::into)? else {
            return Ok(None);
        };
        let decoded = snapshot::decode(&raw).context("Failed to parse todo snapshot")?;
        Ok(Some(decoded))
    }

    async fn write_snapshot(&self) -> Result<()> {
        let payload = snapshot::encode(&self.todos).context("Failed to encode todos")?;
        self.store
            .set(&self.key, payload)
            .await
            .map_err(Into::<anyhow::Error>::into)
            .context("Failed to write todo snapshot")
    }

    async fn persist(&mut self) {
        match self.write_snapshot().await {
            Ok(()) => debug!(key = %self.key, count = self.todos.len(), "Saved todos"),
            Err(err) => {
                error!(key = %self.key, error = %format!("{err:#}"), "Error saving todos");
                self.telemetry
                    .log_error(err.as_ref(), &json!({ "operation": "save", "key": self.key }));
                self.fault = Some(StoreFault::SaveFailed);
            }
        }
    }
}
