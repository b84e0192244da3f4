//! Integration tests for the retention sweep.

use forecast_cache::{list_entries, RetentionPolicy};
use test_utils::{cyprus_grid, CacheDir};

#[test]
fn test_oldest_entry_is_deleted() {
    let cache_dir = CacheDir::new();
    cache_dir.file_entry("CDS_2024-04-06.nc", 3);
    cache_dir.file_entry("CDS_2024-04-07.nc", 2);
    cache_dir.file_entry("CDS_2024-04-08.nc", 1);

    let report = RetentionPolicy::new(2).sweep(cache_dir.path()).unwrap();

    assert!(report.deleted_any());
    assert_eq!(report.deleted, vec![cache_dir.join("CDS_2024-04-06.nc")]);
    assert_eq!(cache_dir.names(), vec!["CDS_2024-04-07.nc", "CDS_2024-04-08.nc"]);
}

#[test]
fn test_keeps_min_of_max_and_total() {
    for (total, max) in [(3u64, 5usize), (5, 5), (7, 5), (4, 1)] {
        let cache_dir = CacheDir::new();
        for day in 0..total {
            cache_dir.file_entry(&format!("CDS_2024-03-{:02}.nc", day + 1), total - day);
        }

        let report = RetentionPolicy::new(max).sweep(cache_dir.path()).unwrap();
        let expected = std::cmp::min(max, total as usize);
        assert_eq!(report.kept.len(), expected);
        assert_eq!(report.deleted.len(), total as usize - expected);
        assert_eq!(cache_dir.names().len(), expected);
    }
}

#[test]
fn test_second_sweep_deletes_nothing() {
    let cache_dir = CacheDir::new();
    for day in 1..=6u64 {
        cache_dir.file_entry(&format!("CDS_2024-04-0{}.nc", day), 10 - day);
    }

    let policy = RetentionPolicy::default();
    assert_eq!(policy.sweep(cache_dir.path()).unwrap().deleted.len(), 1);

    let again = policy.sweep(cache_dir.path()).unwrap();
    assert!(!again.deleted_any());
    assert_eq!(again.kept.len(), 5);
}

#[test]
fn test_directory_stores_are_removed() {
    let cache_dir = CacheDir::new();
    let old = cache_dir.zarr_entry("CDS_2024-04-07.zarr", &cyprus_grid(2), 2);
    cache_dir.zarr_entry("CDS_2024-04-08.zarr", &cyprus_grid(2), 1);

    let report = RetentionPolicy::new(1).sweep(cache_dir.path()).unwrap();
    assert_eq!(report.deleted, vec![old.clone()]);
    assert!(!old.exists());
}

#[test]
fn test_listing_is_newest_first() {
    let cache_dir = CacheDir::new();
    cache_dir.file_entry("CDS_2024-04-08.nc", 1);
    cache_dir.file_entry("CDS_2024-04-09.nc", 0);
    cache_dir.file_entry("CDS_2024-04-06.nc", 3);

    let names: Vec<_> = list_entries(cache_dir.path())
        .unwrap()
        .into_iter()
        .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["CDS_2024-04-09.nc", "CDS_2024-04-08.nc", "CDS_2024-04-06.nc"]
    );
}
