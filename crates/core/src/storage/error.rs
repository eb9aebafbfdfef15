//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
///
/// Failures carry the operation and key so they can be logged and traced
/// back to a single object.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object under the key.
    #[error("object not found: {key}")]
    NotFound {
        /// Key that was looked up.
        key: String,
    },

    /// The provider could not be set up.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// The provider failed an operation on an object.
    #[error("storage {operation} failed for {key}: {message}")]
    Operation {
        /// `write` or `read`.
        operation: &'static str,
        /// Object key.
        key: String,
        /// Provider error text.
        message: String,
    },

    /// Key is empty or could escape the storage root.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Classify a provider error raised while running `operation` on `key`.
    #[must_use]
    pub fn from_provider(operation: &'static str, key: &str, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: key.to_string(),
            },
            _ => Self::Operation {
                operation,
                key: key.to_string(),
                message: err.to_string(),
            },
        }
    }
}
