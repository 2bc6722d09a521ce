//! Blocking key-value storage contract shared by the stores.

use anyhow::Error;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};
use taskdeck_store_fs::{FileStore, FileStoreError};

/// Minimal durable storage abstraction required by the stores.
///
/// Values are opaque strings; the stores decide how they are encoded.
pub trait KeyValueStore {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error>;

    /// Read the value stored under `key`.
    ///
    /// # Errors
    /// Returns a store-specific error when the value cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    /// Returns a store-specific error when the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Delete the value stored under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    /// Returns a store-specific error when the value cannot be removed.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

impl KeyValueStore for FileStore {
    type Error = FileStoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Self::get(self, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        Self::set(self, key, value)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        Self::remove(self, key)
    }
}

impl<S> KeyValueStore for &S
where
    S: KeyValueStore + ?Sized,
{
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (*self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        (*self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        (*self).remove(key)
    }
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        (**self).remove(key)
    }
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, replacing any previous one.
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.lock().insert(key.into(), value.into());
        self
    }

    /// Peek at the stored value without going through the trait.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.peek(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<S: KeyValueStore>(store: &S) -> Result<(), Error> {
        store.set("todos", "[]").map_err(Into::<Error>::into)?;
        assert_eq!(store.get("todos").map_err(Into::<Error>::into)?.as_deref(), Some("[]"));
        store.remove("todos").map_err(Into::<Error>::into)?;
        assert_eq!(store.get("todos").map_err(Into::<Error>::into)?, None);
        store.remove("todos").map_err(Into::<Error>::into)?;
        Ok(())
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        other
            .set("user", "{}")
            .unwrap_or_else(|err| match err {});
        assert_eq!(store.peek("user").as_deref(), Some("{}"));
    }

    #[test]
    fn memory_store_roundtrip_through_references() {
        let store = MemoryStore::new();
        roundtrip(&store).unwrap_or_else(|err| panic!("memory roundtrip: {err}"));
        roundtrip(&Arc::new(store)).unwrap_or_else(|err| panic!("arc roundtrip: {err}"));
    }

    #[test]
    fn file_store_implements_contract() {
        let dir = tempfile::TempDir::with_prefix("taskdeck-kv-")
            .unwrap_or_else(|err| panic!("create temp dir: {err}"));
        let store = FileStore::open(dir.path()).unwrap_or_else(|err| panic!("open store: {err}"));
        roundtrip(&store).unwrap_or_else(|err| panic!("file roundtrip: {err}"));
    }
}
