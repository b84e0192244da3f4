//! Error types for the forecast cache crate.

use thiserror::Error;

/// Errors that can occur while fetching or managing cached forecasts.
///
/// The cache itself never surfaces these to its caller; they are logged and
/// folded into the completeness decision. They are returned by the fetcher
/// and the listing helpers so callers outside the cache can act on them.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Retrieve job {job_id} ended as {status}: {message}")]
    Job {
        job_id: String,
        status: String,
        message: String,
    },

    #[error("Retrieve job {0} did not finish in time")]
    Timeout(String),

    #[error("Failed to access cache directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected API response: {0}")]
    Response(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Credentials unavailable: {0}")]
    Credentials(#[from] aq_common::CommonError),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
