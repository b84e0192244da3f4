//! Region selectors.
//!
//! A selector says which part of a grid to extract and how to reduce it:
//! an [`Area`] is reduced to quantiles over its cells, a [`PointSet`] keeps
//! one value per named point.

use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, Result};

/// Spatial extent of an [`Area`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extent {
    /// Closed latitude and longitude intervals; bounds may be given in
    /// either order.
    BoundingBox { lat: (f64, f64), lon: (f64, f64) },
    /// A single location, matched to the nearest grid cell.
    Point { lat: f64, lon: f64 },
}

impl Extent {
    pub fn is_point(&self) -> bool {
        matches!(self, Extent::Point { .. })
    }
}

/// A named region at one vertical level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
    #[serde(flatten)]
    pub extent: Extent,
    #[serde(default)]
    pub level: i32,
}

impl Area {
    pub fn bounding_box(name: impl Into<String>, lat: (f64, f64), lon: (f64, f64)) -> Self {
        Self {
            name: name.into(),
            extent: Extent::BoundingBox { lat, lon },
            level: 0,
        }
    }

    pub fn point(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            extent: Extent::Point { lat, lon },
            level: 0,
        }
    }

    pub fn at_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }
}

/// Named points at one level, kept in aligned sequences.
///
/// The order of the points is the order of the output columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PointSet {
    names: Vec<String>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    level: i32,
}

impl PointSet {
    pub fn new(names: Vec<String>, lats: Vec<f64>, lons: Vec<f64>, level: i32) -> Result<Self> {
        if names.len() != lats.len() || names.len() != lons.len() {
            return Err(ExtractionError::MisalignedPoints {
                names: names.len(),
                lats: lats.len(),
                lons: lons.len(),
            });
        }
        Ok(Self {
            names,
            lats,
            lons,
            level,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate `(name, lat, lon)` in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64, f64)> + '_ {
        self.names
            .iter()
            .zip(&self.lats)
            .zip(&self.lons)
            .map(|((name, &lat), &lon)| (name.as_str(), lat, lon))
    }

    /// Combine point areas into one set, preserving their order.
    ///
    /// Every area must be a point and all must share a level. No areas
    /// give an empty set at level 0.
    pub fn combine(areas: &[Area]) -> Result<Self> {
        let level = areas.first().map(|a| a.level).unwrap_or(0);
        let mut set = PointSet {
            level,
            ..Default::default()
        };

        for area in areas {
            let Extent::Point { lat, lon } = area.extent else {
                return Err(ExtractionError::NotAPoint(area.name.clone()));
            };
            if area.level != level {
                return Err(ExtractionError::MixedLevels {
                    expected: level,
                    found: area.level,
                });
            }
            set.names.push(area.name.clone());
            set.lats.push(lat);
            set.lons.push(lon);
        }
        Ok(set)
    }
}

/// What to extract from a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionSelector {
    Area(Area),
    Points(PointSet),
}

impl RegionSelector {
    /// Label used in logs and output file names.
    pub fn name(&self) -> &str {
        match self {
            RegionSelector::Area(area) => &area.name,
            RegionSelector::Points(_) => "points",
        }
    }

    pub fn level(&self) -> i32 {
        match self {
            RegionSelector::Area(area) => area.level,
            RegionSelector::Points(points) => points.level,
        }
    }
}

impl From<Area> for RegionSelector {
    fn from(area: Area) -> Self {
        RegionSelector::Area(area)
    }
}

impl From<PointSet> for RegionSelector {
    fn from(points: PointSet) -> Self {
        RegionSelector::Points(points)
    }
}

/// Combine point areas into a [`PointSet`]; see [`PointSet::combine`].
pub fn combine(areas: &[Area]) -> Result<PointSet> {
    PointSet::combine(areas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_preserves_order() {
        let points = combine(&[
            Area::point("LARTRA", 34.91666, 33.62750),
            Area::point("MARIND", 34.73722, 33.29920),
            Area::point("PARTRA", 35.04583, 33.97770),
        ])
        .unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points.names(), ["LARTRA", "MARIND", "PARTRA"]);
        assert_eq!(points.lats(), [34.91666, 34.73722, 35.04583]);
        assert_eq!(points.lons(), [33.62750, 33.29920, 33.97770]);
        assert_eq!(points.level(), 0);
    }

    #[test]
    fn test_combine_empty() {
        let points = combine(&[]).unwrap();
        assert!(points.is_empty());
        assert_eq!(points.level(), 0);
    }

    #[test]
    fn test_combine_rejects_bounding_box() {
        let err = combine(&[
            Area::point("LARTRA", 34.91666, 33.62750),
            Area::bounding_box("Cyprus", (35.7, 34.2), (32.2, 34.7)),
        ])
        .unwrap_err();
        assert!(matches!(err, ExtractionError::NotAPoint(ref name) if name == "Cyprus"));
    }

    #[test]
    fn test_combine_rejects_mixed_levels() {
        let err = combine(&[
            Area::point("A", 35.0, 33.0).at_level(50),
            Area::point("B", 35.0, 33.0),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::MixedLevels {
                expected: 50,
                found: 0
            }
        ));
    }

    #[test]
    fn test_misaligned_points() {
        let err = PointSet::new(vec!["A".into()], vec![35.0, 34.0], vec![33.0], 0).unwrap_err();
        assert!(matches!(err, ExtractionError::MisalignedPoints { lats: 2, .. }));
    }

    #[test]
    fn test_area_from_yaml_shape() {
        let area: Area = serde_json::from_str(
            r#"{"name": "Cyprus", "lat": [35.7, 34.2], "lon": [32.2, 34.7]}"#,
        )
        .unwrap();
        assert_eq!(area.extent, Extent::BoundingBox { lat: (35.7, 34.2), lon: (32.2, 34.7) });
        assert_eq!(area.level, 0);

        let station: Area =
            serde_json::from_str(r#"{"name": "NICTRA", "lat": 35.15194, "lon": 33.34777}"#).unwrap();
        assert!(station.extent.is_point());
    }
}
