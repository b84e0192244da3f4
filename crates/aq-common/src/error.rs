//! Error types for the common value types.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised while building or parsing shared value types.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Invalid date range: {start} is after {end}")]
    InvertedRange { start: String, end: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Failed to read credentials file: {0}")]
    CredentialsFile(#[from] std::io::Error),

    #[error("Failed to parse credentials: {0}")]
    CredentialsFormat(#[from] serde_yaml::Error),
}
