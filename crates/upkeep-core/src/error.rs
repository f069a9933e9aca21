//! Error types for upkeep-core.
//!
//! Nothing in this subsystem is fatal to a host application. Source and
//! notification failures are recovered locally (the candidate is treated
//! as absent, the notification as undelivered); these types exist so the
//! recovery sites can log something more useful than a string.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for upkeep-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Update-source errors (remote check, local feed)
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Background-notification channel errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Persistence-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the database file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Update-source errors. These never propagate to the user; a failing
/// source resolves to "no candidate" for the current pass.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Remote update check failed
    #[error("Remote update check failed: {0}")]
    Remote(String),

    /// Local feed file could not be read
    #[error("Failed to read update feed at {path}: {source}")]
    FeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Background-notification channel errors. Swallowed and logged by the
/// notifier; they never alter the visible-reminder cadence.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The user denied (or never granted) notification permission
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The delivery primitive itself failed
    #[error("Notification channel failed: {0}")]
    ChannelFailed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
