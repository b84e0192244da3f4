//! Integration tests for the forecast cache state machine.
//!
//! The remote archive is replaced by mock fetchers that count calls and
//! optionally write a grid to the target path.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use aq_common::DateRange;
use chrono::NaiveDate;
use forecast_cache::{
    CacheConfig, CacheError, ForecastCache, ForecastRequest, OfflineFetcher, RemoteFetcher,
};
use grid_store::{Grid, ZarrGridStore};
use test_utils::{cyprus_grid, with_gap, CacheDir};

// ============================================================================
// Mock fetchers
// ============================================================================

/// Writes `grid` to the target when set, otherwise fails. Counts calls.
struct MockFetcher {
    grid: Option<Grid>,
    calls: AtomicUsize,
}

impl MockFetcher {
    fn writing(grid: Grid) -> Self {
        Self {
            grid: Some(grid),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            grid: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteFetcher for MockFetcher {
    async fn fetch(&self, _request: &ForecastRequest, target: &Path) -> forecast_cache::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.grid {
            Some(grid) => ZarrGridStore::new()
                .write(target, grid)
                .map_err(|e| CacheError::Fetch(e.to_string())),
            None => Err(CacheError::Fetch("archive unavailable".to_string())),
        }
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn request(day: &str, hours: u32) -> ForecastRequest {
    ForecastRequest {
        lead_time_hours: hours,
        ..ForecastRequest::for_dates(DateRange::single(date(day)))
    }
}

fn config(dir: &Path) -> CacheConfig {
    CacheConfig {
        output_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

// ============================================================================
// Cache hits
// ============================================================================

#[tokio::test]
async fn test_complete_entry_skips_fetch() {
    let cache_dir = CacheDir::new();
    let target = cache_dir.zarr_entry("CDS_2024-04-09.zarr", &cyprus_grid(4), 0);

    let fetcher = Arc::new(MockFetcher::failing());
    let cache = ForecastCache::new(ZarrGridStore::new(), fetcher.clone(), config(cache_dir.path()));
    let result = cache.get_forecast(&request("2024-04-09", 4)).await;

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(result.file, target);
    assert_eq!(result.date, date("2024-04-09"));
}

#[tokio::test]
async fn test_missing_entry_is_fetched() {
    let cache_dir = CacheDir::new();
    let fetcher = Arc::new(MockFetcher::writing(cyprus_grid(4)));
    let cache = ForecastCache::new(ZarrGridStore::new(), fetcher.clone(), config(cache_dir.path()));

    let result = cache.get_forecast(&request("2024-04-09", 4)).await;
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(result.file, cache_dir.join("CDS_2024-04-09.zarr"));
    assert_eq!(result.date, date("2024-04-09"));

    // Second call is served from the cache
    cache.get_forecast(&request("2024-04-09", 4)).await;
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_incomplete_entry_is_refetched() {
    let cache_dir = CacheDir::new();
    cache_dir.zarr_entry(
        "CDS_2024-04-09.zarr",
        &with_gap(&cyprus_grid(4), "dust", 3, 0, 0),
        0,
    );

    let fetcher = Arc::new(MockFetcher::writing(cyprus_grid(4)));
    let cache = ForecastCache::new(ZarrGridStore::new(), fetcher.clone(), config(cache_dir.path()));
    let result = cache.get_forecast(&request("2024-04-09", 4)).await;

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(result.date, date("2024-04-09"));
}

// ============================================================================
// Fallback
// ============================================================================

#[tokio::test]
async fn test_failed_fetch_falls_back_to_most_recent_entry() {
    let cache_dir = CacheDir::new();
    cache_dir.zarr_entry("CDS_2024-04-06.zarr", &cyprus_grid(4), 3);
    let newest = cache_dir.zarr_entry("CDS_2024-04-08.zarr", &cyprus_grid(4), 1);
    cache_dir.zarr_entry("CDS_2024-04-07.zarr", &cyprus_grid(4), 2);

    let fetcher = Arc::new(MockFetcher::failing());
    let cache = ForecastCache::new(ZarrGridStore::new(), fetcher.clone(), config(cache_dir.path()));
    let req = request("2024-04-09", 4);
    let result = cache.get_forecast(&req).await;

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(result.file, newest);
    assert_eq!(result.date, date("2024-04-08"));
    assert!(result.is_stale(&req));
}

#[tokio::test]
async fn test_fallback_serves_incomplete_entry() {
    let cache_dir = CacheDir::new();
    let partial = cache_dir.zarr_entry(
        "CDS_2024-04-08.zarr",
        &with_gap(&cyprus_grid(4), "o3_conc", 0, 1, 1),
        1,
    );

    let cache = ForecastCache::new(
        ZarrGridStore::new(),
        MockFetcher::failing(),
        config(cache_dir.path()),
    );
    let result = cache.get_forecast(&request("2024-04-09", 4)).await;
    assert_eq!(result.file, partial);
    assert_eq!(result.date, date("2024-04-08"));
}

#[tokio::test]
async fn test_fallback_to_undated_entry_uses_request_date() {
    let cache_dir = CacheDir::new();
    let undated = cache_dir.file_entry("latest.nc", 0);

    let cache = ForecastCache::new(
        ZarrGridStore::new(),
        MockFetcher::failing(),
        config(cache_dir.path()),
    );
    let result = cache.get_forecast(&request("2024-04-09", 4)).await;
    assert_eq!(result.file, undated);
    assert_eq!(result.date, date("2024-04-09"));
}

#[tokio::test]
async fn test_empty_cache_returns_placeholder() {
    let cache_dir = CacheDir::new();
    let output_dir = cache_dir.join("CDS");

    let cache = ForecastCache::new(
        ZarrGridStore::new(),
        MockFetcher::failing(),
        config(&output_dir),
    );
    let result = cache.get_forecast(&request("2024-04-09", 4)).await;

    assert!(output_dir.is_dir());
    assert_eq!(result.file, output_dir.join("CDS_2024-04-09.zarr"));
    assert_eq!(result.date, date("2024-04-09"));
    assert!(!result.file.exists());
}

#[tokio::test]
async fn test_multi_day_range_is_never_complete() {
    let cache_dir = CacheDir::new();
    let fetcher = Arc::new(MockFetcher::failing());
    let cache = ForecastCache::new(ZarrGridStore::new(), fetcher.clone(), config(cache_dir.path()));

    let range = DateRange::new(date("2024-04-09"), date("2024-04-11")).unwrap();
    let result = cache
        .get_forecast(&ForecastRequest {
            lead_time_hours: 4,
            ..ForecastRequest::for_dates(range)
        })
        .await;

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(result.file, cache_dir.join("CDS_2024-04-09_2024-04-11.zip"));
    assert_eq!(result.date, date("2024-04-11"));
}

// ============================================================================
// Dry run and retention
// ============================================================================

#[tokio::test]
async fn test_dry_run_never_fetches() {
    let cache_dir = CacheDir::new();
    let fetcher = Arc::new(MockFetcher::writing(cyprus_grid(4)));
    let cache = ForecastCache::new(
        ZarrGridStore::new(),
        fetcher.clone(),
        CacheConfig {
            dry_run: true,
            ..config(cache_dir.path())
        },
    );

    cache.get_forecast(&request("2024-04-09", 4)).await;
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_offline_fetcher_serves_cached_entry() {
    let cache_dir = CacheDir::new();
    let cached = cache_dir.zarr_entry("CDS_2024-04-08.zarr", &cyprus_grid(4), 1);

    let cache = ForecastCache::new(ZarrGridStore::new(), OfflineFetcher, config(cache_dir.path()));
    let result = cache.get_forecast(&request("2024-04-09", 4)).await;
    assert_eq!(result.file, cached);
}

#[tokio::test]
async fn test_get_forecast_sweeps_old_entries() {
    let cache_dir = CacheDir::new();
    for day in 1..=4u64 {
        cache_dir.file_entry(&format!("CDS_2024-04-0{}.nc", day), 10 - day);
    }

    let cache = ForecastCache::new(
        ZarrGridStore::new(),
        MockFetcher::writing(cyprus_grid(4)),
        CacheConfig {
            max_entries: 2,
            ..config(cache_dir.path())
        },
    );
    cache.get_forecast(&request("2024-04-09", 4)).await;

    assert_eq!(
        cache_dir.names(),
        vec!["CDS_2024-04-04.nc", "CDS_2024-04-09.zarr"]
    );
}

#[tokio::test]
async fn test_concurrent_calls_fetch_once() {
    let cache_dir = CacheDir::new();
    let fetcher = Arc::new(MockFetcher::writing(cyprus_grid(4)));
    let cache = ForecastCache::new(ZarrGridStore::new(), fetcher.clone(), config(cache_dir.path()));

    let req = request("2024-04-09", 4);
    let (a, b) = tokio::join!(cache.get_forecast(&req), cache.get_forecast(&req));

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(a, b);
}
