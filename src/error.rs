//! Unified error handling for the workout tracker.
//!
//! Every fallible operation in this crate returns [`Result`], so callers see
//! a single error type whether the failure came from input validation, a
//! store lookup, the storage backend, or the host's location service.

use thiserror::Error;

/// Unified error type for tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    // Workout validation errors
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    // Store errors
    #[error("No workout with id '{id}'")]
    NotFound { id: String },

    #[error("Workout id '{id}' is already in the store")]
    DuplicateId { id: String },

    #[error("No workouts to show")]
    EmptyCollection,

    // Controller errors
    #[error("No location selected; pick a point on the map first")]
    LocationNotSelected,

    #[error("Could not determine current position: {message}")]
    Geolocation { message: String },

    // Persistence errors
    #[error("Stored snapshot is corrupt: {message}")]
    CorruptData { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TrackerError {
    /// Shorthand for a validation failure on a named input field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        TrackerError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Serialization(err.to_string())
    }
}

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
