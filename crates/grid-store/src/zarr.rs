//! Zarr V3 cache backend.
//!
//! Each cache entry is a directory store laid out as:
//!
//! ```text
//! CDS_2024-04-09.zarr/
//!   zarr.json              root group, attribute `variables` lists codes in order
//!   time/                  float64 offsets, attribute `units` = "hours"
//!   level/ latitude/ longitude/
//!   <code>/                float32 [time, level, latitude, longitude], NaN fill
//! ```
//!
//! Chunks that were never written read back as the NaN fill value, so an
//! interrupted write shows up as missing time steps.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::debug;
use zarrs::array::{Array, ArrayBuilder, ChunkGrid, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::{Group, GroupBuilder};
use zarrs_filesystem::FilesystemStore;

use crate::error::{GridStoreError, Result};
use crate::grid::{time_offset, Grid, Variable, DIMENSIONS, SPECIES_ATTR};
use crate::store::GridStore;

const VARIABLES_ATTR: &str = "variables";
const DIMENSIONS_ATTR: &str = "_ARRAY_DIMENSIONS";
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Grid store reading and writing Zarr V3 directory stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZarrGridStore;

impl ZarrGridStore {
    pub fn new() -> Self {
        Self
    }

    /// Write `grid` as a Zarr store at `path`, creating the directory.
    pub fn write(&self, path: &Path, grid: &Grid) -> Result<()> {
        std::fs::create_dir_all(path)?;
        let store = Arc::new(FilesystemStore::new(path).map_err(GridStoreError::zarr)?);

        let codes: Vec<&str> = grid.variables().iter().map(|v| v.name.as_str()).collect();
        let mut attrs = Map::new();
        attrs.insert(VARIABLES_ATTR.to_string(), json!(codes));
        attrs.insert("dimensions".to_string(), json!(DIMENSIONS));

        let group: Group<FilesystemStore> = GroupBuilder::new()
            .attributes(attrs)
            .build(store.clone(), "/")
            .map_err(GridStoreError::zarr)?;
        group.store_metadata().map_err(GridStoreError::zarr)?;

        let hours: Vec<f64> = grid
            .time
            .iter()
            .map(|d| d.num_milliseconds() as f64 / MS_PER_HOUR)
            .collect();
        write_coordinate(&store, "time", &hours, Some("hours"))?;
        write_coordinate(&store, "level", &grid.level, None)?;
        write_coordinate(&store, "latitude", &grid.latitude, Some("degrees_north"))?;
        write_coordinate(&store, "longitude", &grid.longitude, Some("degrees_east"))?;

        let shape: Vec<u64> = grid.shape().iter().map(|&n| n as u64).collect();
        for variable in grid.variables() {
            write_variable(&store, variable, &shape)?;
        }

        debug!(
            path = %path.display(),
            shape = ?grid.shape(),
            variables = grid.variables().len(),
            "Wrote Zarr grid"
        );
        Ok(())
    }
}

impl GridStore for ZarrGridStore {
    fn extension(&self) -> &str {
        "zarr"
    }

    fn open(&self, path: &Path) -> Result<Grid> {
        if !path.exists() {
            return Err(GridStoreError::NotFound(path.display().to_string()));
        }
        if !path.is_dir() {
            return Err(GridStoreError::invalid_format(format!(
                "{} is not a Zarr directory store",
                path.display()
            )));
        }

        let store = Arc::new(FilesystemStore::new(path).map_err(GridStoreError::zarr)?);
        let group = Group::open(store.clone(), "/")
            .map_err(|e| GridStoreError::invalid_format(format!("root group: {e}")))?;

        let codes: Vec<String> = group
            .attributes()
            .get(VARIABLES_ATTR)
            .and_then(Value::as_array)
            .ok_or_else(|| GridStoreError::MissingData(format!("{VARIABLES_ATTR} attribute")))?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        let time = read_coordinate(&store, "time")?
            .into_iter()
            .map(|h| time_offset(h, MS_PER_HOUR))
            .collect::<Result<Vec<_>>>()?;
        let mut grid = Grid::new(
            time,
            read_coordinate(&store, "level")?,
            read_coordinate(&store, "latitude")?,
            read_coordinate(&store, "longitude")?,
        );

        let shape: Vec<u64> = grid.shape().iter().map(|&n| n as u64).collect();
        for code in codes {
            grid.push_variable(read_variable(&store, &code, &shape)?)?;
        }

        Ok(grid)
    }
}

fn chunk_grid_for(shape: &[u64]) -> Result<ChunkGrid> {
    // One chunk per array; zero-length axes still need a non-zero chunk.
    let chunk_shape: Vec<u64> = shape.iter().map(|&n| n.max(1)).collect();
    chunk_shape
        .try_into()
        .map_err(|e| GridStoreError::Zarr(format!("{:?}", e)))
}

fn write_coordinate(
    store: &Arc<FilesystemStore>,
    name: &str,
    values: &[f64],
    units: Option<&str>,
) -> Result<()> {
    let shape = vec![values.len() as u64];

    let mut attrs = Map::new();
    attrs.insert(DIMENSIONS_ATTR.to_string(), json!([name]));
    if let Some(units) = units {
        attrs.insert("units".to_string(), json!(units));
    }

    let mut binding = ArrayBuilder::new(
        shape.clone(),
        DataType::Float64,
        chunk_grid_for(&shape)?,
        FillValue::from(f64::NAN),
    );
    let array = binding
        .attributes(attrs)
        .build(store.clone(), &format!("/{name}"))
        .map_err(GridStoreError::zarr)?;
    array.store_metadata().map_err(GridStoreError::zarr)?;

    if !values.is_empty() {
        let subset = ArraySubset::new_with_start_shape(vec![0], shape)
            .map_err(GridStoreError::zarr)?;
        array
            .store_array_subset_elements(&subset, values)
            .map_err(GridStoreError::zarr)?;
    }
    Ok(())
}

fn write_variable(store: &Arc<FilesystemStore>, variable: &Variable, shape: &[u64]) -> Result<()> {
    let mut attrs = Map::new();
    attrs.insert(DIMENSIONS_ATTR.to_string(), json!(DIMENSIONS));
    if let Some(species) = &variable.species {
        attrs.insert(SPECIES_ATTR.to_string(), json!(species));
    }
    if let Some(units) = &variable.units {
        attrs.insert("units".to_string(), json!(units));
    }

    let mut binding = ArrayBuilder::new(
        shape.to_vec(),
        DataType::Float32,
        chunk_grid_for(shape)?,
        FillValue::from(f32::NAN),
    );
    let array = binding
        .attributes(attrs)
        .build(store.clone(), &format!("/{}", variable.name))
        .map_err(GridStoreError::zarr)?;
    array.store_metadata().map_err(GridStoreError::zarr)?;

    if !variable.values().is_empty() {
        let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape.to_vec())
            .map_err(GridStoreError::zarr)?;
        array
            .store_array_subset_elements(&subset, variable.values())
            .map_err(GridStoreError::zarr)?;
    }
    Ok(())
}

fn read_coordinate(store: &Arc<FilesystemStore>, name: &str) -> Result<Vec<f64>> {
    let array = Array::open(store.clone(), &format!("/{name}"))
        .map_err(|_| GridStoreError::MissingDimension(name.to_string()))?;

    let shape = array.shape().to_vec();
    if shape.len() != 1 {
        return Err(GridStoreError::invalid_format(format!(
            "coordinate '{name}' has {} dimensions",
            shape.len()
        )));
    }
    if shape[0] == 0 {
        return Ok(Vec::new());
    }

    let subset = ArraySubset::new_with_start_shape(vec![0], shape).map_err(GridStoreError::zarr)?;
    let values: Vec<f64> = array
        .retrieve_array_subset_elements(&subset)
        .map_err(GridStoreError::zarr)?;
    Ok(values)
}

fn read_variable(store: &Arc<FilesystemStore>, code: &str, shape: &[u64]) -> Result<Variable> {
    let array = Array::open(store.clone(), &format!("/{code}"))
        .map_err(|e| GridStoreError::MissingData(format!("variable '{code}': {e}")))?;

    if array.shape() != shape {
        return Err(GridStoreError::invalid_format(format!(
            "variable '{code}' has shape {:?}, expected {:?}",
            array.shape(),
            shape
        )));
    }

    let attrs = array.attributes();
    let species = attrs
        .get(SPECIES_ATTR)
        .and_then(Value::as_str)
        .map(str::to_string);
    let units = attrs.get("units").and_then(Value::as_str).map(str::to_string);

    let values: Vec<f32> = if shape.iter().any(|&n| n == 0) {
        Vec::new()
    } else {
        let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape.to_vec())
            .map_err(GridStoreError::zarr)?;
        array
            .retrieve_array_subset_elements(&subset)
            .map_err(GridStoreError::zarr)?
    };

    let mut variable = Variable::new(code, values);
    variable.species = species;
    variable.units = units;
    Ok(variable)
}
