//! Custom error types for the application.
//!
//! The primary error type, `MeasurementError`, consolidates the failure
//! modes of a measurement session. Errors are resolved at the boundary where
//! they occur: validation and spawn failures are returned synchronously from
//! `start`, stop-token write failures are logged and downgraded, and stream
//! termination is delivered asynchronously through the session event channel
//! rather than as an error.

use crate::import::ImportError;
use crate::series::DuplicateSeries;
use crate::validation::ValidationError;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, MeasurementError>;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum MeasurementError {
    /// Settings file missing or malformed.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// One of the pre-start output-target rules failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The worker executable could not be launched.
    #[error("Failed to launch worker: {0}")]
    Spawn(std::io::Error),

    /// `start` was called while a session is already active.
    #[error("A measurement session is already active")]
    SessionActive,

    /// `stop_requested` was called with no session running.
    #[error("No measurement session is running")]
    NotRunning,

    /// A series with the requested name already exists in the store.
    #[error(transparent)]
    Series(#[from] DuplicateSeries),

    /// Historical CSV import failed; nothing was committed.
    #[error(transparent)]
    Import(#[from] ImportError),
}
