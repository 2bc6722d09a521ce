//! Application layer logic for taskdeck.
//!
//! This crate provides the todo and identity stores, their storage seams,
//! configuration, telemetry and input validation shared by front ends.

pub mod async_store;
pub mod config;
pub mod identity;
pub mod input;
pub mod persistence;
pub mod telemetry;
pub mod todo_store;

// Re-exports for convenience
pub use async_store::{AsyncKeyValueStore, SharedStore, shared};
pub use config::{AppConfig, IdentityConfig, StorageConfig, TelemetryConfig};
pub use identity::{
    DEFAULT_SESSION_KEY, IdentityError, IdentityProvider, IdentityStore, LOGIN_FAILED_MESSAGE,
    MockIdentityProvider, PROFILE_FAILED_MESSAGE,
};
pub use input::{InputError, InputResult, ProfileForm, TodoEditForm, TodoForm};
pub use persistence::{KeyValueStore, MemoryStore};
pub use telemetry::{MemoryTelemetry, NoopTelemetry, TelemetryEvent, TelemetrySink, TracingTelemetry};
pub use todo_store::{DEFAULT_TODOS_KEY, StoreFault, TodoStore};
