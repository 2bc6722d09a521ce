//! Async storage abstraction consumed by the stores.

use anyhow::{Error, Result, anyhow};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::persistence::KeyValueStore;

/// Backend shared between stores and serialized through an async mutex.
pub type SharedStore<S> = Arc<Mutex<S>>;

/// Wrap a blocking store so it can be shared by async callers.
pub fn shared<S>(store: S) -> SharedStore<S> {
    Arc::new(Mutex::new(store))
}

/// Async storage trait for use with `tokio::sync::Mutex`.
///
/// This trait mirrors [`KeyValueStore`] but with async methods, so stores can await
/// durable writes without blocking the runtime.
#[allow(async_fn_in_trait)]
pub trait AsyncKeyValueStore {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error> + Send;

    /// Read the value stored under `key`.
    ///
    /// # Errors
    /// Returns a store-specific error when the value cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    /// Returns a store-specific error when the value cannot be persisted.
    async fn set(&self, key: &str, value: String) -> Result<(), Self::Error>;

    /// Delete the value stored under `key`.
    ///
    /// # Errors
    /// Returns a store-specific error when the value cannot be removed.
    async fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

impl<S> AsyncKeyValueStore for SharedStore<S>
where
    S: KeyValueStore + Clone + Send + 'static,
    S::Error: Send + 'static,
{
    type Error = Error;

    async fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let guard = self.lock().await;
        let store = guard.clone();
        let key = key.to_owned();
        let result = tokio::task::spawn_blocking(move || store.get(&key)).await;
        drop(guard);
        result
            .map_err(|e| anyhow!("Task join error: {e}"))?
            .map_err(Into::into)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), Self::Error> {
        // Keep the guard across the write so writes to one backend land in call order.
        let guard = self.lock().await;
        let store = guard.clone();
        let key = key.to_owned();
        let result = tokio::task::spawn_blocking(move || store.set(&key, &value)).await;
        drop(guard);
        result
            .map_err(|e| anyhow!("Task join error: {e}"))?
            .map_err(Into::into)
    }

    async fn remove(&self, key: &str) -> Result<(), Self::Error> {
        let guard = self.lock().await;
        let store = guard.clone();
        let key = key.to_owned();
        let result = tokio::task::spawn_blocking(move || store.remove(&key)).await;
        drop(guard);
        result
            .map_err(|e| anyhow!("Task join error: {e}"))?
            .map_err(Into::into)
    }
}
