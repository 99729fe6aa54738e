//! Error types for repository operations.

/// Errors that can occur against the store repository.
///
/// Repository failures always propagate unchanged through the layers above:
/// the cache never masks them behind a miss or a default value.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested store was not found.
    #[error("store not found: {id}")]
    NotFound {
        /// The id of the store that was not found.
        id: String,
    },

    /// Failed to reach the backing document store.
    #[error("connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
