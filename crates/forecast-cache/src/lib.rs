//! Forecast acquisition cache.
//!
//! Keeps a bounded directory of forecast files, fetching from the remote
//! archive only when the requested entry is missing or incomplete.
//!
//! # Example
//!
//! ```ignore
//! use forecast_cache::{CacheConfig, CdsClient, CdsClientConfig, ForecastCache, ForecastRequest};
//! use grid_store::ZarrGridStore;
//!
//! let fetcher = CdsClient::new(credentials, CdsClientConfig::default())?;
//! let cache = ForecastCache::new(ZarrGridStore::new(), fetcher, CacheConfig::default());
//! let result = cache.get_forecast(&ForecastRequest::default()).await;
//! println!("{} from {}", result.file.display(), result.date);
//! ```

pub mod cache;
pub mod cds;
pub mod error;
pub mod fetcher;
pub mod naming;
pub mod request;
pub mod retention;

pub use cache::{CacheConfig, ForecastCache, ForecastResult};
pub use cds::{CdsClient, CdsClientConfig, JobState, JobStatus};
pub use error::{CacheError, Result};
pub use fetcher::{OfflineFetcher, RemoteFetcher};
pub use naming::{date_from_entry_name, target_path};
pub use request::{ForecastRequest, DEFAULT_DATASET};
pub use retention::{list_entries, CacheEntry, RetentionPolicy, SweepReport};
