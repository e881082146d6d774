use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by try-on generation.
#[derive(Error, Debug)]
pub enum TryOnError {
    /// The request was rejected before any network call was attempted.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The provider rejected the initial submission.
    #[error("Submission failed with HTTP {status}: {body}")]
    Submission { status: u16, body: String },

    /// A status or result request for a queued job returned non-success.
    #[error("Polling failed with HTTP {status}: {body}")]
    Polling { status: u16, body: String },

    /// The job never reached a terminal status within the attempt ceiling.
    #[error("Job still pending after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// The provider reported the job as failed.
    #[error("Provider reported failure: {message}")]
    ProviderFailure { message: String, logs: Vec<String> },

    /// A terminal success response carried no recognizable image reference.
    #[error("No image returned from {0}")]
    MissingOutput(String),

    /// The response from the provider was missing expected fields.
    #[error("{0}")]
    InvalidResponse(String),

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// The caller abandoned the job locally.
    #[error("Generation was cancelled")]
    Cancelled,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stable tag for a [`TryOnError`], suitable for matching and for the
/// JSON reply handed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Submission,
    Polling,
    Timeout,
    ProviderFailure,
    MissingOutput,
    Network,
    Cancelled,
}

impl TryOnError {
    /// The error's stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TryOnError::Validation(_) => ErrorKind::Validation,
            TryOnError::Submission { .. } => ErrorKind::Submission,
            TryOnError::Polling { .. } => ErrorKind::Polling,
            TryOnError::Timeout { .. } => ErrorKind::Timeout,
            TryOnError::ProviderFailure { .. } => ErrorKind::ProviderFailure,
            // A malformed success body is the same contract mismatch as a missing image.
            TryOnError::MissingOutput(_) | TryOnError::InvalidResponse(_) | TryOnError::Json(_) => {
                ErrorKind::MissingOutput
            }
            TryOnError::Network { .. } => ErrorKind::Network,
            TryOnError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TryOnError>;
