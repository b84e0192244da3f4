//! Region extraction from forecast grids.
//!
//! Turns a gridded forecast into time-indexed tables, either quantile bands
//! over an area or values at named stations.
//!
//! # Example
//!
//! ```ignore
//! use extraction::{process_forecast, reference, RegionSelector, DEFAULT_TIMEZONE};
//!
//! let selectors = vec![
//!     RegionSelector::from(reference::cyprus()),
//!     RegionSelector::from(reference::stations()),
//! ];
//! for extraction in process_forecast(&store, &result, &selectors, DEFAULT_TIMEZONE)? {
//!     extraction.table.write_csv(std::io::stdout())?;
//! }
//! ```

pub mod error;
pub mod pipeline;
pub mod reduce;
pub mod reference;
pub mod select;
pub mod selector;
pub mod table;
pub mod time;

pub use error::{ExtractionError, Result};
pub use pipeline::{process, process_forecast, run, Extraction};
pub use reduce::{quantiles, Series, QUANTILES};
pub use select::{select, Cells, Selection};
pub use selector::{combine, Area, Extent, PointSet, RegionSelector};
pub use table::{ColumnKey, ExtractedTable, ReductionKey};
pub use time::{normalise, parse_timezone, DEFAULT_TIMEZONE};
