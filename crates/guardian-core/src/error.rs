//! Core error types for guardian-core.
//!
//! Every engine operation reports failures synchronously through [`CoreError`].
//! Location failures are the only errors expected in normal operation and are
//! usually swallowed by the engines rather than returned (see [`LocationError`]).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::journey::JourneyId;

/// Core error type for guardian-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A required field was missing or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// A journey is already active; only one may be tracked at a time.
    #[error("Journey {active} is already active")]
    ConflictingActiveJourney { active: JourneyId },

    /// Complete/cancel/share was requested with nothing active.
    #[error("No journey is active")]
    NoActiveJourney,

    /// The position sensor was denied or failed. Non-fatal, retryable.
    #[error("Location unavailable: {0}")]
    LocationUnavailable(#[from] LocationError),

    /// Lookup by id found nothing.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Persistent store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Field-level validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was empty or whitespace only.
    #[error("'{field}' must not be empty")]
    EmptyField { field: &'static str },

    /// A numeric field was out of range.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Why a single-shot position query did not produce coordinates.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    Unavailable(String),

    #[error("position query timed out")]
    Timeout,

    #[error("position query failed: {0}")]
    Failed(String),
}

/// Persistent store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database file
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    /// The stored collection under `key` could not be decoded.
    #[error("Stored collection '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The collection could not be encoded for writing.
    #[error("Failed to encode collection '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to locate or create the data directory.
    #[error("Failed to access data directory: {0}")]
    DataDir(String),

    /// The store refuses writes.
    #[error("Store is read-only: {0}")]
    ReadOnly(String),
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

    /// Key does not exist in the configuration tree.
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
