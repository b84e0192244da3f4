//! Remote forecast retrieval.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::request::ForecastRequest;

/// Retrieves a forecast from a remote archive and writes it to `target`.
///
/// The cache does not trust the outcome: after every call it re-checks the
/// target for completeness, so an `Ok` that wrote a partial grid and an
/// `Err` are handled the same way.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, request: &ForecastRequest, target: &Path) -> Result<()>;
}

#[async_trait]
impl<T: RemoteFetcher + ?Sized> RemoteFetcher for Arc<T> {
    async fn fetch(&self, request: &ForecastRequest, target: &Path) -> Result<()> {
        (**self).fetch(request, target).await
    }
}

/// Fetcher that never contacts the archive; the cache serves whatever it
/// already holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl RemoteFetcher for OfflineFetcher {
    async fn fetch(&self, request: &ForecastRequest, target: &Path) -> Result<()> {
        info!(
            dates = %request.date_range,
            target = %target.display(),
            "Offline, not fetching forecast"
        );
        Ok(())
    }
}
