//! Error types for region extraction.

use chrono::{Duration, NaiveDate};
use grid_store::GridStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Level {0} not present in grid")]
    LevelNotFound(i32),

    #[error("Grid has an empty {0} axis")]
    EmptyAxis(&'static str),

    #[error("Area '{0}' is a bounding box, only point areas can be combined")]
    NotAPoint(String),

    #[error("Cannot combine areas at level {expected} and {found}")]
    MixedLevels { expected: i32, found: i32 },

    #[error("Point set is misaligned: {names} names, {lats} latitudes, {lons} longitudes")]
    MisalignedPoints {
        names: usize,
        lats: usize,
        lons: usize,
    },

    #[error("Time offset {offset} from {reference_date} is outside the calendar")]
    InvalidTime {
        reference_date: NaiveDate,
        offset: Duration,
    },

    #[error("Grid error: {0}")]
    Grid(#[from] GridStoreError),

    #[error("Failed to write table: {0}")]
    Output(String),
}

impl From<csv::Error> for ExtractionError {
    fn from(err: csv::Error) -> Self {
        ExtractionError::Output(err.to_string())
    }
}

impl From<serde_json::Error> for ExtractionError {
    fn from(err: serde_json::Error) -> Self {
        ExtractionError::Output(err.to_string())
    }
}

impl From<std::io::Error> for ExtractionError {
    fn from(err: std::io::Error) -> Self {
        ExtractionError::Output(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
