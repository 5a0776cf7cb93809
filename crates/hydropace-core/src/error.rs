//! Core error types for hydropace-core.
//!
//! thiserror-based hierarchy: one top-level `CoreError` plus per-area
//! enums for validation, storage, and delivery.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for hydropace-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Profile validation failures
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage failures
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Message delivery failures
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Rejected profile input. Raised at construction time only; the
/// scheduling engine assumes a validated profile and is total over
/// valid inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("dose must be between {min} and {max} ml, got {dose_ml}")]
    DoseOutOfRange { dose_ml: u32, min: u32, max: u32 },

    #[error("reminder window start ({start}) must not be after end ({end})")]
    WindowInverted {
        start: chrono::NaiveTime,
        end: chrono::NaiveTime,
    },

    #[error("daily goal must be positive, got {goal_ml} ml")]
    NonPositiveGoal { goal_ml: u32 },

    #[error("{field} must be non-negative, got {seconds}")]
    NegativeInterval { field: &'static str, seconds: f64 },
}

/// User-record storage errors.
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
    QueryFailed(String),

    /// Schema migration failed
    #[error("Store migration failed: {0}")]
    MigrationFailed(String),

    /// No record for the user
    #[error("No record for user {user_id}")]
    NotFound { user_id: i64 },

    /// Concurrent modification detected on save. Retryable: reload and
    /// recompute rather than overwrite.
    #[error("Stale record for user {user_id}: concurrent modification")]
    Stale { user_id: i64 },

    /// Database is locked
    #[error("Store is locked")]
    Locked,
}

/// Messaging collaborator failure. Surfaced to the poller, never rolled
/// back: message loss is preferred over duplicate reminders.
#[derive(Error, Debug, Clone)]
#[error("Failed to deliver message to user {user_id}: {message}")]
pub struct DeliveryError {
    pub user_id: i64,
    pub message: String,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
