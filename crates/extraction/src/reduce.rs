//! Spatial reductions.
//!
//! A block of cells is reduced to quantiles per time step; a point
//! selection keeps the value of each point. Variables are reduced in
//! parallel and returned in grid order.

use grid_store::{Grid, Variable};
use rayon::prelude::*;

use crate::select::{Cells, Selection};
use crate::table::{ColumnKey, ReductionKey};

/// Quantile levels computed for area selections.
pub const QUANTILES: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// One output column: a key and one value per time step.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub key: ColumnKey,
    pub values: Vec<f32>,
}

/// Linear-interpolated quantile of already sorted, NaN-free values.
///
/// Returns NaN for an empty slice.
pub fn quantile_sorted(sorted: &[f32], q: f64) -> f32 {
    match sorted.len() {
        0 => f32::NAN,
        1 => sorted[0],
        n => {
            let position = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = position.floor() as usize;
            let upper = position.ceil() as usize;
            let fraction = position - lower as f64;
            let (a, b) = (sorted[lower] as f64, sorted[upper] as f64);
            (a + (b - a) * fraction) as f32
        }
    }
}

/// Quantiles of `values` at each level in `levels`, skipping NaN.
pub fn quantiles(values: &[f32], levels: &[f64]) -> Vec<f32> {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    levels.iter().map(|&q| quantile_sorted(&sorted, q)).collect()
}

/// Reduce every variable of `grid` over `selection`.
///
/// Columns come out ordered by variable (grid order), then by key
/// (quantile ascending, or point order). An empty selection gives no
/// columns.
pub fn reduce(grid: &Grid, selection: &Selection) -> Vec<Series> {
    if selection.is_empty() {
        return Vec::new();
    }

    let per_variable: Vec<Vec<Series>> = grid
        .variables()
        .par_iter()
        .map(|variable| reduce_variable(grid, variable, selection))
        .collect();
    per_variable.into_iter().flatten().collect()
}

fn reduce_variable(grid: &Grid, variable: &Variable, selection: &Selection) -> Vec<Series> {
    let steps = grid.time.len();
    let level = selection.level;
    let value = |t: usize, y: usize, x: usize| {
        grid.value(variable, t, level, y, x)
            .unwrap_or(f32::NAN)
    };

    match &selection.cells {
        Cells::Block { rows, cols } => {
            let mut columns: Vec<Vec<f32>> = vec![Vec::with_capacity(steps); QUANTILES.len()];
            let mut cells = Vec::with_capacity(rows.len() * cols.len());
            for t in 0..steps {
                cells.clear();
                for &y in rows {
                    for &x in cols {
                        cells.push(value(t, y, x));
                    }
                }
                for (column, q) in columns.iter_mut().zip(quantiles(&cells, &QUANTILES)) {
                    column.push(q);
                }
            }

            QUANTILES
                .iter()
                .zip(columns)
                .map(|(&q, values)| Series {
                    key: ColumnKey::new(&variable.name, ReductionKey::Quantile(q)),
                    values,
                })
                .collect()
        }
        Cells::Points { names, cells } => names
            .iter()
            .zip(cells)
            .map(|(name, &(y, x))| Series {
                key: ColumnKey::new(&variable.name, ReductionKey::Point(name.clone())),
                values: (0..steps).map(|t| value(t, y, x)).collect(),
            })
            .collect(),
    }
}
