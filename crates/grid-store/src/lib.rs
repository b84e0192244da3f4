//! Cached forecast grids.
//!
//! This crate reads the gridded air-quality forecasts kept in the local
//! cache and answers the one question the cache layer needs: is a cached
//! entry complete for the requested forecast horizon?
//!
//! # Backends
//!
//! - [`ZarrGridStore`]: Zarr V3 directory stores (always available)
//! - `NetCdfGridStore`: NetCDF-4 files as delivered by the archive
//!   (`netcdf` feature, needs libnetcdf)
//!
//! # Example
//!
//! ```ignore
//! use grid_store::{GridStore, ZarrGridStore};
//!
//! let store = ZarrGridStore::new();
//! if store.is_complete(path, 97) {
//!     let grid = grid_store::rename_variables(&store.open(path)?);
//! }
//! ```

pub mod error;
pub mod grid;
#[cfg(feature = "netcdf")]
pub mod netcdf_store;
pub mod store;
pub mod zarr;

pub use error::{GridStoreError, Result};
pub use grid::{rename_variables, time_offset, Grid, Variable, DIMENSIONS, SPECIES_ATTR};
#[cfg(feature = "netcdf")]
pub use netcdf_store::NetCdfGridStore;
pub use store::GridStore;
pub use zarr::ZarrGridStore;
