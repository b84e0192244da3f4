//! Error types for grid store operations.

use thiserror::Error;

/// Result type for grid store operations.
pub type Result<T> = std::result::Result<T, GridStoreError>;

/// Errors that can occur while reading or writing cached grids.
#[derive(Error, Debug)]
pub enum GridStoreError {
    /// The cache path does not exist.
    #[error("grid not found: {0}")]
    NotFound(String),

    /// One of the required dimensions is absent.
    #[error("missing dimension: {0}")]
    MissingDimension(String),

    /// Missing required variable or attribute.
    #[error("missing required data: {0}")]
    MissingData(String),

    /// Array shapes or types do not line up.
    #[error("invalid grid format: {0}")]
    InvalidFormat(String),

    /// Zarr store error.
    #[error("Zarr error: {0}")]
    Zarr(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GridStoreError {
    pub fn zarr(err: impl std::fmt::Display) -> Self {
        Self::Zarr(err.to_string())
    }

    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }
}
