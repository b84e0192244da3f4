//! Grid store trait.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;
use crate::grid::Grid;

/// Trait for reading cached forecast grids from durable storage.
///
/// Implementations differ only in on-disk format; the completeness rule is
/// shared.
pub trait GridStore: Send + Sync {
    /// File extension (without dot) of entries written in this format.
    fn extension(&self) -> &str;

    /// Read the dataset at `path`.
    ///
    /// Fails with `NotFound` if the path does not exist.
    fn open(&self, path: &Path) -> Result<Grid>;

    /// Whether the cached grid at `path` holds exactly `expected_steps`
    /// time steps without missing values.
    ///
    /// A missing or unreadable path is reported as incomplete.
    fn is_complete(&self, path: &Path, expected_steps: usize) -> bool {
        if !path.exists() {
            debug!(path = %path.display(), "Cache entry absent");
            return false;
        }

        match self.open(path) {
            Ok(grid) => {
                let complete = grid.complete_steps();
                debug!(
                    path = %path.display(),
                    complete_steps = complete,
                    expected_steps = expected_steps,
                    "Checked cache entry completeness"
                );
                complete == expected_steps
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Cache entry unreadable, treating as incomplete"
                );
                false
            }
        }
    }
}

impl<T: GridStore + ?Sized> GridStore for std::sync::Arc<T> {
    fn extension(&self) -> &str {
        (**self).extension()
    }

    fn open(&self, path: &Path) -> Result<Grid> {
        (**self).open(path)
    }

    fn is_complete(&self, path: &Path, expected_steps: usize) -> bool {
        (**self).is_complete(path, expected_steps)
    }
}
