//! JSON encoding of the durable todo collection.

use std::collections::HashSet;

use crate::id::TodoId;
use crate::todo::Todo;

/// Collection decoded from a durable snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedSnapshot {
    /// Todos in stored order, duplicates removed.
    pub todos: Vec<Todo>,
    /// Ids that appeared more than once (later copies were dropped).
    pub duplicates: Vec<TodoId>,
    /// Ids whose `updatedAt` preceded `createdAt` and was raised to match it.
    pub clamped: Vec<TodoId>,
}

/// Serialize the collection as a JSON array.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn encode(todos: &[Todo]) -> serde_json::Result<String> {
    serde_json::to_string(todos)
}

/// Parse a JSON array of todos, keeping the first occurrence of each id.
///
/// A record whose `updatedAt` is earlier than its `createdAt` gets `updatedAt`
/// raised to `createdAt`.
///
/// # Errors
/// Returns an error when the payload is not a valid todo array.
pub fn decode(raw: &str) -> serde_json::Result<DecodedSnapshot> {
    let parsed: Vec<Todo> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(parsed.len());
    let mut decoded = DecodedSnapshot::default();
    for mut todo in parsed {
        if seen.insert(todo.id.clone()) {
            if todo.updated_at < todo.created_at {
                todo.updated_at = todo.created_at;
                decoded.clamped.push(todo.id.clone());
            }
            decoded.todos.push(todo);
        } else {
            decoded.duplicates.push(todo.id);
        }
    }
    Ok(decoded)
}
