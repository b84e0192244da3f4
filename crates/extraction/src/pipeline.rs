//! Extraction pipeline: select, reduce, normalise time, pivot.

use chrono::NaiveDate;
use chrono_tz::Tz;
use forecast_cache::ForecastResult;
use grid_store::{rename_variables, Grid, GridStore};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::reduce::reduce;
use crate::select::select;
use crate::selector::RegionSelector;
use crate::table::ExtractedTable;
use crate::time::normalise_all;

/// A selector together with the table extracted for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub selector: RegionSelector,
    pub table: ExtractedTable,
}

/// Extract one selector from `grid`.
///
/// Grid time offsets are taken relative to `reference_date` at midnight
/// UTC and reported in `tz`.
pub fn run(
    grid: &Grid,
    selector: &RegionSelector,
    reference_date: NaiveDate,
    tz: Tz,
) -> Result<ExtractedTable> {
    let selection = select(grid, selector)?;
    let series = reduce(grid, &selection);
    let times = normalise_all(reference_date, &grid.time, tz)?;
    let table = ExtractedTable::pivot(&times, series);

    debug!(
        selector = selector.name(),
        cells = selection.cell_count(),
        rows = table.num_rows(),
        columns = table.num_columns(),
        "Extracted region"
    );
    Ok(table)
}

/// Extract every selector from one grid, in order.
pub fn process(
    grid: &Grid,
    selectors: &[RegionSelector],
    reference_date: NaiveDate,
    tz: Tz,
) -> Result<Vec<Extraction>> {
    selectors
        .iter()
        .map(|selector| {
            Ok(Extraction {
                selector: selector.clone(),
                table: run(grid, selector, reference_date, tz)?,
            })
        })
        .collect()
}

/// Open the resolved forecast, relabel its variables by species and
/// extract every selector, using the forecast date as reference date.
#[instrument(skip(store, selectors), fields(file = %result.file.display(), date = %result.date))]
pub fn process_forecast<S: GridStore>(
    store: &S,
    result: &ForecastResult,
    selectors: &[RegionSelector],
    tz: Tz,
) -> Result<Vec<Extraction>> {
    let grid = rename_variables(&store.open(&result.file)?);
    let extractions = process(&grid, selectors, result.date, tz)?;

    info!(
        selectors = extractions.len(),
        variables = grid.variables().len(),
        steps = grid.time.len(),
        "Processed forecast"
    );
    Ok(extractions)
}
