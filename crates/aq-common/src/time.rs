//! Date handling for forecast requests.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CommonError, CommonResult};

/// An inclusive range of forecast dates.
///
/// One range identifies one forecast request. A range covering a single
/// day corresponds to one daily forecast file; longer ranges are bulk
/// archive requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = CommonError;

    fn try_from(raw: RawDateRange) -> CommonResult<Self> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CommonResult<Self> {
        if start > end {
            return Err(CommonError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Range covering a single day.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Range covering today (UTC).
    pub fn today() -> Self {
        Self::single(Utc::now().date_naive())
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// True when start and end are the same day.
    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    /// Number of days covered, inclusive.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Parse `YYYY-MM-DD` or `YYYY-MM-DD/YYYY-MM-DD`.
    pub fn parse(s: &str) -> CommonResult<Self> {
        match s.split_once('/') {
            Some((start, end)) => Self::new(parse_date(start)?, parse_date(end)?),
            None => Ok(Self::single(parse_date(s)?)),
        }
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::today()
    }
}

impl fmt::Display for DateRange {
    /// Formats as `start/end`, the form the retrieve API expects.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start, self.end)
    }
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> CommonResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| CommonError::InvalidDate(s.to_string()))
}
