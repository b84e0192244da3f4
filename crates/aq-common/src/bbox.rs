//! Geographic bounding box in the retrieve API's area order.

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// A geographic bounding box in degrees.
///
/// The remote archive expects areas as `[north, west, south, east]`;
/// this type keeps the edges named so callers cannot swap them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(north: f64, west: f64, south: f64, east: f64) -> Self {
        Self {
            north,
            west,
            south,
            east,
        }
    }

    /// Parse `"north,west,south,east"`.
    pub fn from_area_string(s: &str) -> CommonResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(CommonError::InvalidBbox(format!(
                "{s}: expected 'north,west,south,east'"
            )));
        }

        let mut edges = [0.0; 4];
        for (edge, part) in edges.iter_mut().zip(&parts) {
            *edge = part
                .parse()
                .map_err(|_| CommonError::InvalidBbox(format!("invalid number '{part}'")))?;
        }

        let bbox = Self::new(edges[0], edges[1], edges[2], edges[3]);
        if bbox.south > bbox.north {
            return Err(CommonError::InvalidBbox(format!(
                "south {} is above north {}",
                bbox.south, bbox.north
            )));
        }
        Ok(bbox)
    }

    /// The `area` array sent to the retrieve API.
    pub fn to_area(&self) -> [f64; 4] {
        [self.north, self.west, self.south, self.east]
    }

    /// Check if a point falls inside (edges inclusive).
    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }
}

impl Default for BoundingBox {
    /// Eastern Mediterranean box around Cyprus.
    fn default() -> Self {
        Self::new(36.54, 30.24, 33.63, 36.43)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_order() {
        let bbox = BoundingBox::default();
        assert_eq!(bbox.to_area(), [36.54, 30.24, 33.63, 36.43]);
    }

    #[test]
    fn test_parse_area_string() {
        let bbox = BoundingBox::from_area_string("39.33, 9.02, 30, 45").unwrap();
        assert_eq!(bbox.north, 39.33);
        assert_eq!(bbox.west, 9.02);
        assert_eq!(bbox.south, 30.0);
        assert_eq!(bbox.east, 45.0);
        assert!(bbox.contains_point(35.0, 33.0));
        assert!(!bbox.contains_point(40.0, 33.0));
    }

    #[test]
    fn test_parse_area_string_rejects_flipped() {
        assert!(BoundingBox::from_area_string("30,9,39,45").is_err());
        assert!(BoundingBox::from_area_string("30,9,39").is_err());
    }
}
