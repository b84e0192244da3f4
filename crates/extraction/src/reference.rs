//! Reference regions for Cyprus.

use crate::selector::{Area, PointSet};

/// Air-quality monitoring stations as `(code, latitude, longitude)`.
pub const STATIONS: [(&str, f64, f64); 9] = [
    ("LARTRA", 34.91666, 33.62750),
    ("MARIND", 34.73722, 33.29920),
    ("PARTRA", 35.04583, 33.97770),
    ("NICTRA", 35.15194, 33.34777),
    ("NICRES", 35.12694, 33.33166),
    ("LIMTRA", 34.68611, 33.03555),
    ("PAFTRA", 34.77527, 32.42194),
    ("ZYGIND", 34.72944, 33.33753),
    ("AYMBGR", 35.03805, 33.05777),
];

/// The island as a bounding box at the surface level.
pub fn cyprus() -> Area {
    Area::bounding_box("Cyprus", (35.7, 34.2), (32.2, 34.7))
}

/// The monitoring stations as point areas.
pub fn station_areas() -> Vec<Area> {
    STATIONS
        .iter()
        .map(|&(code, lat, lon)| Area::point(code, lat, lon))
        .collect()
}

/// The monitoring stations combined into one point set.
pub fn stations() -> PointSet {
    let names = STATIONS.iter().map(|s| s.0.to_string()).collect();
    let lats = STATIONS.iter().map(|s| s.1).collect();
    let lons = STATIONS.iter().map(|s| s.2).collect();
    // Lengths come from one table.
    PointSet::new(names, lats, lons, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::combine;

    #[test]
    fn test_stations_match_combined_areas() {
        assert_eq!(stations(), combine(&station_areas()).unwrap());
        assert_eq!(stations().len(), 9);
        assert_eq!(stations().names()[3], "NICTRA");
    }

    #[test]
    fn test_cyprus_area() {
        let area = cyprus();
        assert_eq!(area.name, "Cyprus");
        assert_eq!(area.level, 0);
        assert!(!area.extent.is_point());
    }
}
