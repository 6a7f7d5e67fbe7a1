//! Core error types for resetrun-core.
//!
//! Most of the engine is fail-soft: malformed persisted data and remote
//! failures degrade to fresh or local-only state instead of surfacing here.
//! These types cover what is left: disk writes, configuration files and the
//! transport-level failures that the reconciler logs before swallowing.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for resetrun-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Local blob storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote profile store errors
    #[error("Remote profile error: {0}")]
    Remote(#[from] RemoteError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while writing local blobs.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to write a blob to disk
    #[error("Failed to write '{key}' at {path}: {source}")]
    WriteFailed {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to remove a blob from disk
    #[error("Failed to remove '{key}' at {path}: {source}")]
    RemoveFailed {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize an entity before writing it
    #[error("Failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
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
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Remote profile store errors.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Network or transport failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote answered with an unexpected status
    #[error("Remote returned status {status} for {uid}")]
    Status { uid: String, status: u16 },

    /// Response body was not a JSON document
    #[error("Malformed response for {uid}: {message}")]
    Malformed { uid: String, message: String },

    /// Remote base URL could not be used
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Remote store is switched off
    #[error("Remote profile store is disabled")]
    Disabled,

    /// Injected or backend-specific failure
    #[error("{0}")]
    Unavailable(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Calendar-day key was not `YYYY-MM-DD`
    #[error("Invalid date key: '{0}'")]
    InvalidDateKey(String),

    /// Daily goal outside 1..=3
    #[error("Daily goal must be 1, 2 or 3 (got {0})")]
    InvalidDailyGoal(i64),

    /// Unknown mode identifier
    #[error("Unknown mode: '{0}'")]
    UnknownMode(String),

    /// Mode listed more than once
    #[error("Mode listed twice: '{0}'")]
    DuplicateMode(String),

    /// Session length outside the supported set
    #[error("Session length must be 2, 5 or 10 minutes (got {0})")]
    InvalidSessionLength(i64),

    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
