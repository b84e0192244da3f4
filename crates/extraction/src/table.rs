//! Time-indexed extraction tables.
//!
//! Columns carry a two-level key: the variable and either a quantile level
//! or a point name. Rows are instants in the target time zone, sorted and
//! unique.

use std::fmt;
use std::io::Write;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::reduce::Series;

/// Second level of a column key.
#[derive(Debug, Clone, PartialEq)]
pub enum ReductionKey {
    Quantile(f64),
    Point(String),
}

impl fmt::Display for ReductionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReductionKey::Quantile(q) => write!(f, "{}", q),
            ReductionKey::Point(name) => f.write_str(name),
        }
    }
}

impl Serialize for ReductionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ReductionKey::Quantile(q) => serializer.serialize_f64(*q),
            ReductionKey::Point(name) => serializer.serialize_str(name),
        }
    }
}

/// Two-level column key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnKey {
    pub variable: String,
    pub key: ReductionKey,
}

impl ColumnKey {
    pub fn new(variable: impl Into<String>, key: ReductionKey) -> Self {
        Self {
            variable: variable.into(),
            key,
        }
    }
}

/// Pivoted extraction result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedTable {
    index: Vec<DateTime<Tz>>,
    columns: Vec<ColumnKey>,
    /// Column-major values, `data[column][row]`.
    data: Vec<Vec<f32>>,
}

impl ExtractedTable {
    /// Pivot reduced series onto the time index.
    ///
    /// `times[t]` is the instant of step `t` of every series. Rows are
    /// sorted by instant; a repeated instant keeps its first step.
    pub fn pivot(times: &[DateTime<Tz>], series: Vec<Series>) -> Self {
        if series.is_empty() {
            return Self::default();
        }

        let mut order: Vec<usize> = (0..times.len()).collect();
        order.sort_by_key(|&t| times[t]);
        order.dedup_by_key(|t| times[*t]);

        let index = order.iter().map(|&t| times[t]).collect();
        let (columns, data): (Vec<ColumnKey>, Vec<Vec<f32>>) = series
            .into_iter()
            .map(|s| {
                let values: Vec<f32> = order
                    .iter()
                    .map(|&t| s.values.get(t).copied().unwrap_or(f32::NAN))
                    .collect();
                (s.key, values)
            })
            .unzip();

        Self {
            index,
            columns,
            data,
        }
    }

    pub fn index(&self) -> &[DateTime<Tz>] {
        &self.index
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Values of the column `(variable, key)`.
    pub fn column(&self, variable: &str, key: &ReductionKey) -> Option<&[f32]> {
        self.columns
            .iter()
            .position(|c| c.variable == variable && &c.key == key)
            .map(|i| self.data[i].as_slice())
    }

    /// Values of one row, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<f32>> {
        if row >= self.num_rows() {
            return None;
        }
        Some(self.data.iter().map(|column| column[row]).collect())
    }

    /// Distinct variables in column order.
    pub fn variables(&self) -> Vec<&str> {
        let mut variables: Vec<&str> = Vec::new();
        for column in &self.columns {
            if variables.last() != Some(&column.variable.as_str()) {
                variables.push(&column.variable);
            }
        }
        variables
    }

    /// Write as CSV: a `variable` header row, a `key` header row, then one
    /// row per instant (RFC 3339). Missing values are empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::WriterBuilder::new().flexible(false).from_writer(writer);

        let mut header = vec!["variable".to_string()];
        header.extend(self.columns.iter().map(|c| c.variable.clone()));
        csv.write_record(&header)?;

        let mut keys = vec!["key".to_string()];
        keys.extend(self.columns.iter().map(|c| c.key.to_string()));
        csv.write_record(&keys)?;

        for (row, instant) in self.index.iter().enumerate() {
            let mut record = vec![instant.to_rfc3339()];
            record.extend(self.data.iter().map(|column| {
                let v = column[row];
                if v.is_nan() {
                    String::new()
                } else {
                    v.to_string()
                }
            }));
            csv.write_record(&record)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// CSV rendering as a string.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::error::ExtractionError::Output(e.to_string()))
    }

    /// Write as JSON; missing values become `null`.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct TableJson<'a> {
    index: Vec<String>,
    columns: &'a [ColumnKey],
    data: Vec<Vec<Option<f32>>>,
}

impl Serialize for ExtractedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        TableJson {
            index: self.index.iter().map(|t| t.to_rfc3339()).collect(),
            columns: &self.columns,
            data: (0..self.num_rows())
                .map(|row| {
                    self.data
                        .iter()
                        .map(|column| Some(column[row]).filter(|v| !v.is_nan()))
                        .collect()
                })
                .collect(),
        }
        .serialize(serializer)
    }
}
