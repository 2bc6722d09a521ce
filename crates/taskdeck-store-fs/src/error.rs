//! Error types for file store operations.

use thiserror::Error;

/// Errors that can occur during `FileStore` operations.
#[derive(Error, Debug)]
pub enum FileStoreError {
    /// Key contains characters that cannot be mapped onto a file name.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Stored bytes are not valid UTF-8.
    #[error("Value for key {key} is not valid UTF-8")]
    NotUtf8 {
        /// Offending key.
        key: String,
    },

    /// Temporary file could not be moved into place.
    #[error("Failed to persist value for key {key}: {source}")]
    Persist {
        /// Key being written.
        key: String,
        /// Underlying rename failure.
        #[source]
        source: std::io::Error,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
