//! NetCDF cache backend using the native netcdf library.
//!
//! Reads the files the archive delivers directly. Only variables laid out on
//! all four grid dimensions are loaded; coordinate and bookkeeping variables
//! are skipped.

use std::path::Path;

use tracing::debug;

use crate::error::{GridStoreError, Result};
use crate::grid::{time_offset, Grid, Variable, DIMENSIONS, SPECIES_ATTR};
use crate::store::GridStore;

/// Grid store reading NetCDF-4 forecast files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetCdfGridStore;

impl NetCdfGridStore {
    pub fn new() -> Self {
        Self
    }
}

impl GridStore for NetCdfGridStore {
    fn extension(&self) -> &str {
        "nc"
    }

    fn open(&self, path: &Path) -> Result<Grid> {
        if !path.exists() {
            return Err(GridStoreError::NotFound(path.display().to_string()));
        }

        let file = netcdf::open(path)
            .map_err(|e| GridStoreError::invalid_format(format!("Failed to open NetCDF: {}", e)))?;

        let time_var = file
            .variable("time")
            .ok_or_else(|| GridStoreError::MissingDimension("time".to_string()))?;
        let raw_time: Vec<f64> = time_var
            .get_values(..)
            .map_err(|e| GridStoreError::invalid_format(format!("Failed to read time: {}", e)))?;
        let unit_ms = time_unit_ms(get_str_attr(&time_var, "units").as_deref());
        let time = raw_time
            .iter()
            .map(|&t| time_offset(t, unit_ms))
            .collect::<Result<Vec<_>>>()?;

        let mut grid = Grid::new(
            time,
            read_coordinate(&file, "level")?,
            read_coordinate(&file, "latitude")?,
            read_coordinate(&file, "longitude")?,
        );

        for var in file.variables() {
            let name = var.name();
            let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
            if dims != DIMENSIONS {
                debug!(variable = %name, dims = ?dims, "Skipping non-grid variable");
                continue;
            }

            let raw: Vec<f32> = var.get_values(..).map_err(|e| {
                GridStoreError::invalid_format(format!("Failed to read {}: {}", name, e))
            })?;

            let fill = get_f32_attr(&var, "_FillValue").or_else(|| get_f32_attr(&var, "missing_value"));
            let scale_factor = get_f32_attr(&var, "scale_factor").unwrap_or(1.0);
            let add_offset = get_f32_attr(&var, "add_offset").unwrap_or(0.0);

            let values = raw
                .into_iter()
                .map(|val| {
                    if Some(val) == fill {
                        f32::NAN
                    } else {
                        val * scale_factor + add_offset
                    }
                })
                .collect();

            let mut variable = Variable::new(name, values);
            variable.species = get_str_attr(&var, SPECIES_ATTR);
            variable.units = get_str_attr(&var, "units");
            grid.push_variable(variable)?;
        }

        debug!(path = %path.display(), shape = ?grid.shape(), "Read NetCDF grid");
        Ok(grid)
    }
}

/// Milliseconds per unit of a CF `units` string such as `"hours"` or
/// `"hours since 2022-04-09"`. Unknown units are taken as hours.
fn time_unit_ms(units: Option<&str>) -> f64 {
    let unit = units
        .and_then(|u| u.split_whitespace().next())
        .unwrap_or("hours")
        .to_lowercase();
    match unit.as_str() {
        "days" | "day" => 86_400_000.0,
        "minutes" | "minute" | "min" => 60_000.0,
        "seconds" | "second" | "s" => 1_000.0,
        _ => 3_600_000.0,
    }
}

fn read_coordinate(file: &netcdf::File, name: &str) -> Result<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| GridStoreError::MissingDimension(name.to_string()))?;
    var.get_values(..)
        .map_err(|e| GridStoreError::invalid_format(format!("Failed to read {}: {}", name, e)))
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
