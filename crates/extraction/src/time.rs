//! Forecast time normalisation.
//!
//! Grid time offsets count from the forecast reference date at midnight.
//! They become instants by adding the offset to that naive midnight,
//! reading the result as UTC, and only then converting to the target zone.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{ExtractionError, Result};

/// Zone forecasts are reported in unless configured otherwise.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Nicosia;

/// Absolute instant of `offset` after `reference_date` 00:00, in `tz`.
pub fn normalise(reference_date: NaiveDate, offset: Duration, tz: Tz) -> Result<DateTime<Tz>> {
    let naive = reference_date
        .and_time(NaiveTime::MIN)
        .checked_add_signed(offset)
        .ok_or(ExtractionError::InvalidTime {
            reference_date,
            offset,
        })?;
    Ok(Utc.from_utc_datetime(&naive).with_timezone(&tz))
}

/// Normalise every offset of a grid's time axis.
pub fn normalise_all(
    reference_date: NaiveDate,
    offsets: &[Duration],
    tz: Tz,
) -> Result<Vec<DateTime<Tz>>> {
    offsets
        .iter()
        .map(|&offset| normalise(reference_date, offset, tz))
        .collect()
}

/// Parse an IANA zone name such as `Asia/Nicosia`.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_winter_offset() {
        let t = normalise(date("2024-01-15"), Duration::hours(0), DEFAULT_TIMEZONE).unwrap();
        assert_eq!(t.to_rfc3339(), "2024-01-15T02:00:00+02:00");
    }

    #[test]
    fn test_summer_offset() {
        let t = normalise(date("2022-04-09"), Duration::hours(12), DEFAULT_TIMEZONE).unwrap();
        assert_eq!(t.to_rfc3339(), "2022-04-09T15:00:00+03:00");
    }

    #[test]
    fn test_offset_crosses_dst_change() {
        // Cyprus moves to summer time at 01:00 UTC on 2024-03-31
        let times = normalise_all(
            date("2024-03-30"),
            &[Duration::hours(24), Duration::hours(25)],
            DEFAULT_TIMEZONE,
        )
        .unwrap();
        assert_eq!(times[0].to_rfc3339(), "2024-03-31T02:00:00+02:00");
        assert_eq!(times[1].to_rfc3339(), "2024-03-31T04:00:00+03:00");
    }

    #[test]
    fn test_offset_beyond_calendar() {
        let err = normalise(
            date("2024-04-09"),
            Duration::milliseconds(i64::MAX),
            DEFAULT_TIMEZONE,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidTime { .. }));

        let err = normalise_all(
            date("2024-04-09"),
            &[Duration::hours(0), Duration::days(-1_000_000_000)],
            DEFAULT_TIMEZONE,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidTime { .. }));
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Asia/Nicosia"), Some(DEFAULT_TIMEZONE));
        assert_eq!(parse_timezone("UTC"), Some(chrono_tz::UTC));
        assert_eq!(parse_timezone("Mars/Olympus"), None);
    }
}
