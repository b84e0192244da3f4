//! Cache directory listing and the retention sweep.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Number of entries kept by default.
pub const DEFAULT_MAX_ENTRIES: usize = 5;

/// One materialised forecast in the cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    pub path: PathBuf,
    /// Filesystem modification time of the entry.
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_directory_store(&self) -> bool {
        self.path.is_dir()
    }

    fn name(&self) -> &std::ffi::OsStr {
        self.path.file_name().unwrap_or_default()
    }
}

/// Newest first; equal timestamps fall back to the name, descending.
fn newest_first(a: &CacheEntry, b: &CacheEntry) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.name().cmp(a.name()))
}

/// List the entries of `dir`, newest first.
///
/// Hidden entries (in-flight `.partial` downloads among them) are skipped.
/// Entries whose timestamp cannot be read, such as one removed while the
/// directory is scanned or a dangling link, are skipped with a warning.
/// A missing directory lists as empty.
pub fn list_entries(dir: &Path) -> Result<Vec<CacheEntry>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for item in std::fs::read_dir(dir)? {
        let path = match item {
            Ok(item) => item.path(),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to read cache directory entry");
                continue;
            }
        };
        if path.file_name().map_or(true, |n| n.to_string_lossy().starts_with('.')) {
            continue;
        }
        match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => entries.push(CacheEntry {
                path,
                created_at: DateTime::<Utc>::from(modified),
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable cache entry");
            }
        }
    }

    entries.sort_by(newest_first);
    Ok(entries)
}

fn remove_entry(entry: &CacheEntry) -> std::io::Result<()> {
    if entry.is_directory_store() {
        std::fs::remove_dir_all(&entry.path)
    } else {
        std::fs::remove_file(&entry.path)
    }
}

/// Outcome of one retention sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub kept: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    /// Entries whose deletion failed, with the error message.
    pub failed: Vec<(PathBuf, String)>,
}

impl SweepReport {
    /// True when at least one entry was removed.
    pub fn deleted_any(&self) -> bool {
        !self.deleted.is_empty()
    }
}

/// Keeps the most recently created entries of a cache directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub max_entries: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl RetentionPolicy {
    pub fn new(max_entries: usize) -> Self {
        Self { max_entries }
    }

    /// Delete every entry of `dir` beyond the `max_entries` newest.
    ///
    /// Every deletion is attempted; failures are logged and recorded in the
    /// report rather than aborting the sweep.
    pub fn sweep(&self, dir: &Path) -> Result<SweepReport> {
        self.sweep_with(dir, remove_entry)
    }

    fn sweep_with<F>(&self, dir: &Path, mut remove: F) -> Result<SweepReport>
    where
        F: FnMut(&CacheEntry) -> std::io::Result<()>,
    {
        let entries = list_entries(dir)?;
        let mut report = SweepReport::default();

        for (index, entry) in entries.into_iter().enumerate() {
            if index < self.max_entries {
                report.kept.push(entry.path);
                continue;
            }

            match remove(&entry) {
                Ok(()) => {
                    debug!(path = %entry.path.display(), "Removed cache entry");
                    report.deleted.push(entry.path);
                }
                Err(e) => {
                    warn!(
                        path = %entry.path.display(),
                        error = %e,
                        "Failed to remove cache entry"
                    );
                    report.failed.push((entry.path, e.to_string()));
                }
            }
        }

        if report.deleted_any() {
            info!(
                dir = %dir.display(),
                kept = report.kept.len(),
                deleted = report.deleted.len(),
                "Retention sweep removed old entries"
            );
        }
        Ok(report)
    }
}
