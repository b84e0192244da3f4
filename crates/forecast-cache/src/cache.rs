//! The forecast cache.
//!
//! `get_forecast` answers "which file should I read for this request?". It
//! fetches only when the deterministic target entry is missing or
//! incomplete, falls back to the most recent entry when the fetch does not
//! produce a complete grid, and sweeps old entries on every call. Failures
//! along the way are logged and never surface to the caller.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use grid_store::GridStore;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use aq_common::DateRange;

use crate::fetcher::RemoteFetcher;
use crate::naming::{self, date_from_entry_name};
use crate::request::ForecastRequest;
use crate::retention::{list_entries, RetentionPolicy, SweepReport, DEFAULT_MAX_ENTRIES};

/// Cache location and behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub output_dir: PathBuf,
    /// File name prefix of cache entries
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Entries kept by the retention sweep
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Never contact the archive
    #[serde(default)]
    pub dry_run: bool,
}

fn default_prefix() -> String {
    "CDS".to_string()
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data/CDS"),
            prefix: default_prefix(),
            max_entries: default_max_entries(),
            dry_run: false,
        }
    }
}

/// The file to read for a request and the date its forecast starts on.
///
/// `date` is the request end date when the requested entry is complete.
/// When the cache fell back to an older entry it is the date encoded in
/// that entry's name, which tells the caller the data is stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastResult {
    pub date: NaiveDate,
    pub file: PathBuf,
}

impl ForecastResult {
    /// True when the result is not the entry for `request`.
    pub fn is_stale(&self, request: &ForecastRequest) -> bool {
        self.date != request.date_range.end()
    }
}

/// Local forecast cache backed by a grid store and a remote fetcher.
pub struct ForecastCache<S, F> {
    store: S,
    fetcher: F,
    config: CacheConfig,
    retention: RetentionPolicy,
    lock: Mutex<()>,
}

impl<S: GridStore, F: RemoteFetcher> ForecastCache<S, F> {
    pub fn new(store: S, fetcher: F, config: CacheConfig) -> Self {
        let retention = RetentionPolicy::new(config.max_entries);
        Self {
            store,
            fetcher,
            config,
            retention,
            lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Deterministic entry path for a date range.
    pub fn target_path(&self, range: &DateRange) -> PathBuf {
        naming::target_path(
            &self.config.output_dir,
            &self.config.prefix,
            range,
            self.store.extension(),
        )
    }

    /// Resolve `request` to a readable forecast file, fetching if needed.
    ///
    /// Calls on the same cache are serialised.
    #[instrument(skip(self, request), fields(dates = %request.date_range))]
    pub async fn get_forecast(&self, request: &ForecastRequest) -> ForecastResult {
        let _guard = self.lock.lock().await;

        if let Err(e) = std::fs::create_dir_all(&self.config.output_dir) {
            warn!(
                dir = %self.config.output_dir.display(),
                error = %e,
                "Failed to create cache directory"
            );
        }

        let target = self.target_path(&request.date_range);
        let expected_steps = request.expected_steps();

        if self.store.is_complete(&target, expected_steps) {
            info!(path = %target.display(), "Forecast already cached, skipping fetch");
        } else if self.config.dry_run {
            info!(path = %target.display(), "Dry run, not fetching forecast");
        } else {
            info!(
                path = %target.display(),
                expected_steps = expected_steps,
                "Fetching forecast"
            );
            if let Err(e) = self.fetcher.fetch(request, &target).await {
                warn!(path = %target.display(), error = %e, "Forecast fetch failed");
            }
        }

        let result = self.resolve(request, &target);
        self.sweep();
        result
    }

    /// Pick the file to serve for `request` given its target entry.
    pub fn resolve(&self, request: &ForecastRequest, target: &Path) -> ForecastResult {
        let end = request.date_range.end();

        if self.store.is_complete(target, request.expected_steps()) {
            return ForecastResult {
                date: end,
                file: target.to_path_buf(),
            };
        }

        let newest = match list_entries(&self.config.output_dir) {
            Ok(entries) => entries.into_iter().next(),
            Err(e) => {
                warn!(
                    dir = %self.config.output_dir.display(),
                    error = %e,
                    "Failed to list cache directory"
                );
                None
            }
        };

        match newest {
            Some(entry) => {
                let date = date_from_entry_name(&entry.path).unwrap_or_else(|| {
                    warn!(
                        path = %entry.path.display(),
                        "Cache entry name carries no date, using request end date"
                    );
                    end
                });
                warn!(
                    requested = %target.display(),
                    fallback = %entry.path.display(),
                    date = %date,
                    "Requested forecast incomplete, serving most recent entry"
                );
                ForecastResult {
                    date,
                    file: entry.path,
                }
            }
            None => {
                warn!(path = %target.display(), "Cache is empty, returning requested path");
                ForecastResult {
                    date: end,
                    file: target.to_path_buf(),
                }
            }
        }
    }

    /// Run the retention sweep over the cache directory.
    pub fn sweep(&self) -> SweepReport {
        match self.retention.sweep(&self.config.output_dir) {
            Ok(report) => {
                debug!(
                    kept = report.kept.len(),
                    deleted = report.deleted.len(),
                    failed = report.failed.len(),
                    "Retention sweep finished"
                );
                report
            }
            Err(e) => {
                warn!(
                    dir = %self.config.output_dir.display(),
                    error = %e,
                    "Retention sweep failed"
                );
                SweepReport::default()
            }
        }
    }
}
