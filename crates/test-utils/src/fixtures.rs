//! Cache directory fixtures.
//!
//! [`CacheDir`] wraps a temporary directory and creates cache entries with
//! a chosen age, so tests can control which entry counts as most recent.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use grid_store::{Grid, ZarrGridStore};
use tempfile::TempDir;

/// Seconds in one day.
pub const DAY_SECS: u64 = 24 * 3600;

/// Set the modification time of `path` to `age` before now.
///
/// Works for plain files and for directory stores.
pub fn set_age(path: &Path, age: Duration) {
    let file = if path.is_dir() {
        File::open(path)
    } else {
        File::options().write(true).open(path)
    }
    .expect("entry exists");
    file.set_modified(SystemTime::now() - age)
        .expect("modification time can be set");
}

/// A temporary cache directory.
pub struct CacheDir {
    dir: TempDir,
}

impl CacheDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `grid` as a Zarr entry `name`, `age_days` old.
    pub fn zarr_entry(&self, name: &str, grid: &Grid, age_days: u64) -> PathBuf {
        let path = self.join(name);
        ZarrGridStore::new()
            .write(&path, grid)
            .expect("Failed to write Zarr entry");
        set_age(&path, Duration::from_secs(age_days * DAY_SECS));
        path
    }

    /// Create an opaque file entry `name`, `age_days` old.
    pub fn file_entry(&self, name: &str, age_days: u64) -> PathBuf {
        let path = self.join(name);
        std::fs::write(&path, b"not a grid").expect("Failed to write entry");
        set_age(&path, Duration::from_secs(age_days * DAY_SECS));
        path
    }

    /// Names of the entries currently in the directory, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.path())
            .expect("Failed to read cache dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for CacheDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::cyprus_grid;

    #[test]
    fn test_entries_get_requested_age() {
        let cache = CacheDir::new();
        let old = cache.file_entry("CDS_2024-04-06.nc", 3);
        let new = cache.zarr_entry("CDS_2024-04-08.zarr", &cyprus_grid(2), 1);

        let old_time = std::fs::metadata(&old).unwrap().modified().unwrap();
        let new_time = std::fs::metadata(&new).unwrap().modified().unwrap();
        assert!(old_time < new_time);
        assert_eq!(cache.names(), vec!["CDS_2024-04-06.nc", "CDS_2024-04-08.zarr"]);
    }
}
