//! File-backed key-value storage for taskdeck.
//!
//! Every key maps onto `<root>/<key>.json`. Writes land in a temporary file inside
//! the same directory and are renamed over the target, so readers observe either the
//! previous value or the new one.

mod error;

pub use error::FileStoreError;

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const VALUE_EXTENSION: &str = "json";

/// Storage rooted at a directory, one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the storage directory.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create storage directory {}", root.display()))?;
        Ok(Self { root })
    }

    /// Directory holding the value files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, FileStoreError> {
        if !is_valid_key(key) {
            return Err(FileStoreError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(format!("{key}.{VALUE_EXTENSION}")))
    }

    /// Read the value stored under `key`.
    ///
    /// # Errors
    /// Returns an error for invalid keys, unreadable files or non UTF-8 content.
    pub fn get(&self, key: &str) -> Result<Option<String>, FileStoreError> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(%key, "No stored value");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let value = String::from_utf8(bytes).map_err(|_| FileStoreError::NotUtf8 {
            key: key.to_owned(),
        })?;
        debug!(%key, bytes = value.len(), "Read stored value");
        Ok(Some(value))
    }

    /// Atomically replace the value stored under `key`.
    ///
    /// # Errors
    /// Returns an error for invalid keys or when the file cannot be written.
    pub fn set(&self, key: &str, value: &str) -> Result<(), FileStoreError> {
        let path = self.path_for(key)?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|err| FileStoreError::Persist {
            key: key.to_owned(),
            source: err.error,
        })?;
        info!(%key, path = %path.display(), bytes = value.len(), "Stored value");
        Ok(())
    }

    /// Delete the value stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    /// Returns an error for invalid keys or when the file cannot be removed.
    pub fn remove(&self, key: &str) -> Result<(), FileStoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(%key, "Removed value");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Returns true when `key` can be used as a file stem.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileStore) {
        let dir = TempDir::with_prefix("taskdeck-store-")
            .unwrap_or_else(|err| panic!("create temp dir: {err}"));
        let store = FileStore::open(dir.path().join("data"))
            .unwrap_or_else(|err| panic!("open store: {err}"));
        (dir, store)
    }

    #[test]
    fn set_and_get_roundtrip() -> Result<()> {
        let (_dir, store) = temp_store();
        store.set("todos", "[1,2,3]")?;
        assert_eq!(store.get("todos")?.as_deref(), Some("[1,2,3]"));

        store.set("todos", "[]")?;
        assert_eq!(store.get("todos")?.as_deref(), Some("[]"));
        Ok(())
    }

    #[test]
    fn missing_key_reads_as_none() -> Result<()> {
        let (_dir, store) = temp_store();
        assert_eq!(store.get("user")?, None);
        Ok(())
    }

    #[test]
    fn remove_is_idempotent() -> Result<()> {
        let (_dir, store) = temp_store();
        store.set("user", "{}")?;
        store.remove("user")?;
        store.remove("user")?;
        assert_eq!(store.get("user")?, None);
        Ok(())
    }

    #[test]
    fn values_survive_reopen() -> Result<()> {
        let (_dir, store) = temp_store();
        store.set("todos", "[\"x\"]")?;

        let reopened = FileStore::open(store.root())?;
        assert_eq!(reopened.get("todos")?.as_deref(), Some("[\"x\"]"));
        Ok(())
    }

    #[test]
    fn no_temporary_files_are_left_behind() -> Result<()> {
        let (_dir, store) = temp_store();
        store.set("todos", "[]")?;
        store.set("user", "{}")?;

        let mut names: Vec<String> = fs::read_dir(store.root())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["todos.json", "user.json"]);
        Ok(())
    }

    #[test]
    fn rejects_keys_that_escape_the_root() {
        let (_dir, store) = temp_store();
        for key in ["", "../todos", "a/b", ".hidden", "with space"] {
            assert!(
                matches!(store.get(key), Err(FileStoreError::InvalidKey(_))),
                "key {key:?} must be rejected"
            );
        }
        assert!(is_valid_key("todos.v2"));
    }
}
