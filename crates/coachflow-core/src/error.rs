//! Core error types for coachflow-core.
//!
//! Only invalid configuration and storage faults are errors. Notification
//! rejections are ordinary outcomes (see [`crate::notify::GateOutcome`]) and
//! "no active phase" is an `Option`, so neither appears here.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for coachflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The subscription tier is not known to the phase catalog.
    #[error("Unknown subscription tier: {0}")]
    UnknownTier(String),

    /// The record store failed. Callers may retry; the engine does not.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

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

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A catalog segment must last at least one day
    #[error("Segment {order} of tier {tier} has zero duration")]
    EmptySegment { tier: String, order: u32 },

    /// A tier was configured without any segment
    #[error("Tier {0} has no segments")]
    EmptyTier(String),

    /// Probability outside [0, 1]
    #[error("Probability for {field} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { field: String, value: f64 },

    /// No session with that number for the subject
    #[error("Subject {subject_id} has no session #{session_number}")]
    SessionNotFound {
        subject_id: String,
        session_number: u32,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg)
                if code.code == rusqlite::ErrorCode::DatabaseLocked
                    || code.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::StoreUnavailable(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
