//! In-memory model of a forecast grid.
//!
//! A grid is indexed by `time × level × latitude × longitude` and carries
//! any number of named variables sharing those axes. Values are stored in
//! row-major order with longitude varying fastest.

use chrono::Duration;

use crate::error::{GridStoreError, Result};

/// Names of the grid dimensions, in storage order.
pub const DIMENSIONS: [&str; 4] = ["time", "level", "latitude", "longitude"];

/// Attribute carrying a variable's human-readable species name.
pub const SPECIES_ATTR: &str = "species";

/// One named variable on the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Variable code as stored in the file (or species name after renaming).
    pub name: String,
    /// Species name from the file metadata.
    pub species: Option<String>,
    /// Physical units.
    pub units: Option<String>,
    values: Vec<f32>,
}

impl Variable {
    pub fn new(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            species: None,
            units: None,
            values,
        }
    }

    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Raw values in `[time, level, latitude, longitude]` order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// A gridded dataset: coordinate axes plus variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Forecast offsets from the reference date at local midnight.
    pub time: Vec<Duration>,
    pub level: Vec<f64>,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
    variables: Vec<Variable>,
}

impl Grid {
    /// Create a grid with the given axes and no variables.
    pub fn new(time: Vec<Duration>, level: Vec<f64>, latitude: Vec<f64>, longitude: Vec<f64>) -> Self {
        Self {
            time,
            level,
            latitude,
            longitude,
            variables: Vec::new(),
        }
    }

    /// Add a variable, checking that its value count matches the axes.
    pub fn with_variable(mut self, variable: Variable) -> Result<Self> {
        self.push_variable(variable)?;
        Ok(self)
    }

    pub fn push_variable(&mut self, variable: Variable) -> Result<()> {
        let expected = self.len();
        if variable.values.len() != expected {
            return Err(GridStoreError::invalid_format(format!(
                "variable '{}' has {} values, grid shape {:?} needs {}",
                variable.name,
                variable.values.len(),
                self.shape(),
                expected
            )));
        }
        self.variables.push(variable);
        Ok(())
    }

    /// `[time, level, latitude, longitude]` sizes.
    pub fn shape(&self) -> [usize; 4] {
        [
            self.time.len(),
            self.level.len(),
            self.latitude.len(),
            self.longitude.len(),
        ]
    }

    /// Number of values per variable.
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Flat index of a cell.
    pub fn flat_index(&self, t: usize, l: usize, y: usize, x: usize) -> usize {
        let [_, nl, ny, nx] = self.shape();
        ((t * nl + l) * ny + y) * nx + x
    }

    /// Value of `variable` at a cell, `None` when out of range.
    pub fn value(&self, variable: &Variable, t: usize, l: usize, y: usize, x: usize) -> Option<f32> {
        let [nt, nl, ny, nx] = self.shape();
        if t >= nt || l >= nl || y >= ny || x >= nx {
            return None;
        }
        variable.values.get(self.flat_index(t, l, y, x)).copied()
    }

    /// True if no variable has a missing value anywhere in time step `t`.
    pub fn step_is_complete(&self, t: usize) -> bool {
        let step_len = self.len() / self.time.len().max(1);
        let start = t * step_len;
        self.variables
            .iter()
            .all(|v| v.values[start..start + step_len].iter().all(|x| !x.is_nan()))
    }

    /// Number of time steps without missing values in any variable.
    pub fn complete_steps(&self) -> usize {
        (0..self.time.len()).filter(|&t| self.step_is_complete(t)).count()
    }
}

/// Convert a stored time coordinate to an offset.
///
/// `unit_ms` is the length of one coordinate unit in milliseconds. Values
/// that are not finite or do not fit an offset are a format error.
pub fn time_offset(value: f64, unit_ms: f64) -> Result<Duration> {
    let ms = (value * unit_ms).round();
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return Err(GridStoreError::invalid_format(format!(
            "time coordinate {value} is out of range"
        )));
    }
    Ok(Duration::milliseconds(ms as i64))
}

/// Relabel variables with their species names.
///
/// Variables without a species attribute keep their code.
pub fn rename_variables(grid: &Grid) -> Grid {
    let mut renamed = grid.clone();
    for variable in &mut renamed.variables {
        if let Some(species) = &variable.species {
            variable.name = species.clone();
        }
    }
    renamed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step_grid(second: [f32; 4]) -> Grid {
        let mut values = vec![1.0, 2.0, 3.0, 4.0];
        values.extend_from_slice(&second);
        Grid::new(
            vec![Duration::hours(0), Duration::hours(1)],
            vec![0.0],
            vec![35.0, 34.0],
            vec![33.0, 34.0],
        )
        .with_variable(Variable::new("dust", values).with_species("Dust"))
        .unwrap()
    }

    #[test]
    fn test_shape_and_index() {
        let grid = two_step_grid([5.0, 6.0, 7.0, 8.0]);
        assert_eq!(grid.shape(), [2, 1, 2, 2]);
        let dust = grid.variable("dust").unwrap();
        assert_eq!(grid.value(dust, 1, 0, 1, 0), Some(7.0));
        assert_eq!(grid.value(dust, 2, 0, 0, 0), None);
    }

    #[test]
    fn test_variable_size_mismatch() {
        let err = Grid::new(vec![Duration::hours(0)], vec![0.0], vec![1.0], vec![1.0, 2.0])
            .with_variable(Variable::new("dust", vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, GridStoreError::InvalidFormat(_)));
    }

    #[test]
    fn test_incomplete_step_is_detected() {
        let grid = two_step_grid([5.0, f32::NAN, 7.0, 8.0]);
        assert!(grid.step_is_complete(0));
        assert!(!grid.step_is_complete(1));
        assert_eq!(grid.complete_steps(), 1);
    }

    #[test]
    fn test_time_offset() {
        assert_eq!(time_offset(1.5, 3_600_000.0).unwrap(), Duration::minutes(90));
        assert_eq!(time_offset(-2.0, 1_000.0).unwrap(), Duration::seconds(-2));
        for bad in [f64::NAN, f64::INFINITY, 1e300, -1e300] {
            let err = time_offset(bad, 3_600_000.0).unwrap_err();
            assert!(matches!(err, GridStoreError::InvalidFormat(_)));
        }
    }

    #[test]
    fn test_rename_variables() {
        let grid = two_step_grid([5.0, 6.0, 7.0, 8.0])
            .with_variable(Variable::new("no2_conc", vec![0.0; 8]))
            .unwrap();
        let renamed = rename_variables(&grid);
        let names: Vec<_> = renamed.variables().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Dust", "no2_conc"]);
        // original untouched
        assert!(grid.variable("dust").is_some());
    }
}
