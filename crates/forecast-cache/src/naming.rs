//! Cache entry naming.
//!
//! Entries are named from the request dates so that the same request always
//! maps to the same path:
//!
//! - single day: `<prefix>_<start>.<ext>` (e.g. `CDS_2024-04-09.zarr`)
//! - several days: `<prefix>_<start>_<end>.zip` (bulk archive)

use std::path::{Path, PathBuf};

use aq_common::time::parse_date;
use aq_common::DateRange;
use chrono::NaiveDate;

/// Extension used for multi-day bulk archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Path of the cache entry for `range` inside `dir`.
pub fn target_path(dir: &Path, prefix: &str, range: &DateRange, extension: &str) -> PathBuf {
    let name = if range.is_single_day() {
        format!("{}_{}.{}", prefix, range.start(), extension)
    } else {
        format!(
            "{}_{}_{}.{}",
            prefix,
            range.start(),
            range.end(),
            ARCHIVE_EXTENSION
        )
    };
    dir.join(name)
}

/// First date encoded in an entry name, i.e. the first `_`-separated token
/// of the file stem that parses as `YYYY-MM-DD`.
pub fn date_from_entry_name(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    stem.split('_').find_map(|token| parse_date(token).ok())
}
