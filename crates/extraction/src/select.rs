//! Cell selection on grid axes.
//!
//! Levels match exactly. Intervals select every coordinate inside the
//! closed range, keeping axis order; scalars select the nearest coordinate.

use grid_store::Grid;

use crate::error::{ExtractionError, Result};
use crate::selector::{Extent, RegionSelector};

/// Cells picked out of a grid by a selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub level: usize,
    pub cells: Cells,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cells {
    /// The cross product of the selected rows and columns.
    Block { rows: Vec<usize>, cols: Vec<usize> },
    /// One `(row, col)` cell per named point, in point order.
    Points { names: Vec<String>, cells: Vec<(usize, usize)> },
}

impl Selection {
    /// Number of grid cells covered at one time step.
    pub fn cell_count(&self) -> usize {
        match &self.cells {
            Cells::Block { rows, cols } => rows.len() * cols.len(),
            Cells::Points { cells, .. } => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }
}

/// Resolve `selector` against the axes of `grid`.
pub fn select(grid: &Grid, selector: &RegionSelector) -> Result<Selection> {
    let level = level_index(&grid.level, selector.level())?;

    let cells = match selector {
        RegionSelector::Area(area) => match area.extent {
            Extent::BoundingBox { lat, lon } => Cells::Block {
                rows: interval_indices(&grid.latitude, lat),
                cols: interval_indices(&grid.longitude, lon),
            },
            Extent::Point { lat, lon } => {
                let (row, col) = nearest_cell(grid, lat, lon)?;
                Cells::Block {
                    rows: vec![row],
                    cols: vec![col],
                }
            }
        },
        RegionSelector::Points(points) => {
            let mut cells = Vec::with_capacity(points.len());
            for (_, lat, lon) in points.iter() {
                cells.push(nearest_cell(grid, lat, lon)?);
            }
            Cells::Points {
                names: points.names().to_vec(),
                cells,
            }
        }
    };

    Ok(Selection { level, cells })
}

fn nearest_cell(grid: &Grid, lat: f64, lon: f64) -> Result<(usize, usize)> {
    let row = nearest_index(&grid.latitude, lat).ok_or(ExtractionError::EmptyAxis("latitude"))?;
    let col =
        nearest_index(&grid.longitude, lon).ok_or(ExtractionError::EmptyAxis("longitude"))?;
    Ok((row, col))
}

fn level_index(levels: &[f64], level: i32) -> Result<usize> {
    levels
        .iter()
        .position(|&l| l == f64::from(level))
        .ok_or(ExtractionError::LevelNotFound(level))
}

/// Indices of `axis` inside the closed interval spanned by `bounds`.
pub fn interval_indices(axis: &[f64], bounds: (f64, f64)) -> Vec<usize> {
    let (lo, hi) = if bounds.0 <= bounds.1 {
        bounds
    } else {
        (bounds.1, bounds.0)
    };
    axis.iter()
        .enumerate()
        .filter(|(_, &v)| v >= lo && v <= hi)
        .map(|(i, _)| i)
        .collect()
}

/// Index of the coordinate closest to `target`; the first one on ties.
pub fn nearest_index(axis: &[f64], target: f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| {
            let distance = (v - target).abs();
            match best {
                Some((_, d)) if d <= distance => best,
                _ => Some((i, distance)),
            }
        })
        .map(|(i, _)| i)
}
