//! Error types for the sync engine library

use std::path::PathBuf;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Comprehensive error type for sync operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Missing or invalid configuration, detected before any network activity
    #[error("Config error: {0}")]
    Config(String),

    /// Failure to establish a session with a remote endpoint
    #[error("Connection error for '{endpoint}': {message}")]
    Connection { endpoint: String, message: String },

    /// Persisted state exists but cannot be deserialized.
    /// Distinct from a missing state file, which loads as an empty set.
    #[error("State file '{path}' is corrupt: {message}")]
    StateCorrupt { path: PathBuf, message: String },

    /// Fetch or put failed for one file
    #[error("Transfer error for '{file}': {message}")]
    Transfer { file: String, message: String },

    /// Source-side archival failed after a successful transfer
    #[error("Archival error for '{file}': {message}")]
    Archival { file: String, message: String },

    /// Webhook notification failure
    #[error("Notification error: {0}")]
    Notification(String),

    /// Zip bundle construction errors
    #[error("Zip error at '{path}': {message}")]
    Zip { path: PathBuf, message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Create a new config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new connection error
    pub fn connection(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Create a new state corruption error
    pub fn state_corrupt(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::StateCorrupt {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a new per-file transfer error
    pub fn transfer(file: impl Into<String>, message: impl ToString) -> Self {
        Self::Transfer {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Create a new archival error
    pub fn archival(file: impl Into<String>, message: impl ToString) -> Self {
        Self::Archival {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Create a new zip error
    pub fn zip(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Zip {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
