//! Generators for synthetic forecast grids.
//!
//! These build small grids with predictable values so tests can check
//! extraction and completeness results by hand.

use chrono::Duration;
use grid_store::{Grid, Variable};

/// `n` hourly offsets starting at zero.
pub fn hourly_offsets(n: usize) -> Vec<Duration> {
    (0..n as i64).map(Duration::hours).collect()
}

/// `n` evenly spaced axis values starting at `start`.
///
/// A negative `step` gives a descending axis, the way CAMS latitudes run.
pub fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Values where each cell encodes its position: `t * 1000 + y * 10 + x`.
///
/// A single level is assumed. This makes it easy to verify that a selection
/// picked the expected cells.
pub fn create_indexed_values(steps: usize, rows: usize, cols: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(steps * rows * cols);
    for t in 0..steps {
        for y in 0..rows {
            for x in 0..cols {
                data.push((t * 1000 + y * 10 + x) as f32);
            }
        }
    }
    data
}

/// A single-level grid with one variable per `(code, species)` pair.
///
/// Every variable holds [`create_indexed_values`] offset by 100 000 times
/// its position, so each value is unique across the grid.
pub fn forecast_grid(
    steps: usize,
    latitude: Vec<f64>,
    longitude: Vec<f64>,
    variables: &[(&str, &str)],
) -> Grid {
    let (rows, cols) = (latitude.len(), longitude.len());
    let mut grid = Grid::new(hourly_offsets(steps), vec![0.0], latitude, longitude);

    for (i, (code, species)) in variables.iter().enumerate() {
        let offset = (i * 100_000) as f32;
        let values = create_indexed_values(steps, rows, cols)
            .into_iter()
            .map(|v| v + offset)
            .collect();
        grid.push_variable(Variable::new(*code, values).with_species(*species))
            .expect("generated values match the grid shape");
    }
    grid
}

/// A 3x4 grid over Cyprus with `dust` and `o3_conc` variables.
///
/// Latitudes run 35.4, 35.0, 34.6; longitudes 32.5 to 34.0 in 0.5 steps.
pub fn cyprus_grid(steps: usize) -> Grid {
    forecast_grid(
        steps,
        axis(35.4, -0.4, 3),
        axis(32.5, 0.5, 4),
        &[("dust", "Dust"), ("o3_conc", "Ozone")],
    )
}

/// A grid whose single variable holds `values` for each step over a
/// `rows x cols` patch.
pub fn grid_from_steps(code: &str, rows: usize, cols: usize, steps: &[Vec<f32>]) -> Grid {
    let values: Vec<f32> = steps.iter().flatten().copied().collect();
    assert_eq!(values.len(), steps.len() * rows * cols, "step size mismatch");

    let mut grid = Grid::new(
        hourly_offsets(steps.len()),
        vec![0.0],
        axis(35.0, -0.1, rows),
        axis(33.0, 0.1, cols),
    );
    grid.push_variable(Variable::new(code, values))
        .expect("values match the grid shape");
    grid
}

/// Replace the value at `(t, y, x)` of `code` with NaN.
pub fn with_gap(grid: &Grid, code: &str, t: usize, y: usize, x: usize) -> Grid {
    let mut gapped = Grid::new(
        grid.time.clone(),
        grid.level.clone(),
        grid.latitude.clone(),
        grid.longitude.clone(),
    );
    for variable in grid.variables() {
        let mut values = variable.values().to_vec();
        if variable.name == code {
            values[grid.flat_index(t, 0, y, x)] = f32::NAN;
        }
        let mut copy = Variable::new(variable.name.clone(), values);
        copy.species = variable.species.clone();
        copy.units = variable.units.clone();
        gapped
            .push_variable(copy)
            .expect("copied values match the grid shape");
    }
    gapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_values() {
        let values = create_indexed_values(2, 2, 3);
        assert_eq!(values.len(), 12);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[4], 11.0); // y=1, x=1
        assert_eq!(values[6], 1000.0); // t=1
    }

    #[test]
    fn test_cyprus_grid_shape() {
        let grid = cyprus_grid(5);
        assert_eq!(grid.shape(), [5, 1, 3, 4]);
        assert_eq!(grid.variables().len(), 2);
        assert_eq!(grid.complete_steps(), 5);
    }

    #[test]
    fn test_with_gap() {
        let grid = with_gap(&cyprus_grid(3), "o3_conc", 1, 2, 3);
        assert_eq!(grid.complete_steps(), 2);
        assert!(!grid.step_is_complete(1));
    }

    #[test]
    fn test_descending_axis() {
        assert_eq!(axis(35.4, -0.4, 3).len(), 3);
        assert!(axis(35.4, -0.4, 3)[2] < 34.7);
    }
}
