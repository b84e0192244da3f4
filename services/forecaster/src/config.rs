//! Configuration loading for forecast profiles.
//!
//! A profile describes one forecast product: what to request, where its
//! cache lives, and which regions to extract from it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use aq_common::species::DEFAULT_VARIABLES;
use aq_common::{BoundingBox, Credentials, DateRange};
use chrono_tz::Tz;
use extraction::{reference, Area, PointSet, RegionSelector};
use forecast_cache::{CacheConfig, ForecastRequest, DEFAULT_DATASET};
use serde::Deserialize;
use tracing::{debug, warn};

/// Root configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecasterConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// YAML file with `url:` and `key:`; environment variables otherwise
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    #[serde(default = "default_profiles")]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

fn default_timezone() -> String {
    "Asia/Nicosia".to_string()
}

fn default_profiles() -> BTreeMap<String, ProfileConfig> {
    BTreeMap::from([
        ("plot".to_string(), ProfileConfig::default()),
        ("map".to_string(), ProfileConfig::map()),
    ])
}

impl Default for ForecasterConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            credentials_file: None,
            profiles: default_profiles(),
        }
    }
}

/// One forecast product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_lead_time_hours")]
    pub lead_time_hours: u32,
    #[serde(default = "default_lead_time_step")]
    pub lead_time_step_hours: u32,
    #[serde(default = "default_variables")]
    pub variables: Vec<String>,
    #[serde(default)]
    pub area: BoundingBox,
    /// Areas reduced to quantiles
    #[serde(default)]
    pub regions: Vec<Area>,
    /// Also extract the monitoring stations
    #[serde(default)]
    pub stations: bool,
}

fn default_dataset() -> String {
    DEFAULT_DATASET.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/CDS")
}

fn default_prefix() -> String {
    "CDS".to_string()
}

fn default_max_entries() -> usize {
    5
}

fn default_lead_time_hours() -> u32 {
    97
}

fn default_lead_time_step() -> u32 {
    1
}

fn default_variables() -> Vec<String> {
    DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect()
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            output_dir: default_output_dir(),
            prefix: default_prefix(),
            max_entries: default_max_entries(),
            lead_time_hours: default_lead_time_hours(),
            lead_time_step_hours: default_lead_time_step(),
            variables: default_variables(),
            area: BoundingBox::default(),
            regions: vec![reference::cyprus()],
            stations: true,
        }
    }
}

impl ProfileConfig {
    /// Dust over the Mediterranean, for map rendering.
    pub fn map() -> Self {
        Self {
            output_dir: PathBuf::from("data/CDS-map"),
            variables: vec!["dust".to_string()],
            area: BoundingBox::new(39.33, 9.02, 30.0, 45.0),
            regions: Vec::new(),
            stations: false,
            ..Default::default()
        }
    }

    pub fn request(&self, date_range: DateRange) -> ForecastRequest {
        ForecastRequest {
            dataset: self.dataset.clone(),
            variables: self.variables.clone(),
            bounding_box: self.area,
            date_range,
            lead_time_hours: self.lead_time_hours,
            lead_time_step_hours: self.lead_time_step_hours,
        }
    }

    pub fn cache_config(&self, dry_run: bool) -> CacheConfig {
        CacheConfig {
            output_dir: self.output_dir.clone(),
            prefix: self.prefix.clone(),
            max_entries: self.max_entries,
            dry_run,
        }
    }

    /// Regions first, then the station point set.
    pub fn selectors(&self) -> Vec<RegionSelector> {
        let mut selectors: Vec<RegionSelector> =
            self.regions.iter().cloned().map(RegionSelector::from).collect();
        if self.stations {
            let stations: PointSet = reference::stations();
            for (name, lat, lon) in stations.iter() {
                if !self.area.contains_point(lat, lon) {
                    warn!(station = name, "Station lies outside the requested area");
                }
            }
            selectors.push(stations.into());
        }
        selectors
    }
}

impl ForecasterConfig {
    /// Load the configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ForecasterConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(
            path = %path.display(),
            profiles = config.profiles.len(),
            "Loaded forecaster config"
        );
        Ok(config)
    }

    /// Load `path` if it exists, otherwise use the built-in profiles.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn profile(&self, name: &str) -> Result<&ProfileConfig> {
        self.profiles.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
            anyhow!("Unknown profile '{}' (configured: {})", name, known.join(", "))
        })
    }

    pub fn timezone(&self) -> Result<Tz> {
        extraction::parse_timezone(&self.timezone)
            .ok_or_else(|| anyhow!("Unknown time zone '{}'", self.timezone))
    }

    /// Credentials from the configured file, or from the environment.
    #[cfg_attr(not(feature = "netcdf"), allow(dead_code))]
    pub fn credentials(&self) -> Result<Credentials> {
        match &self.credentials_file {
            Some(path) => Credentials::from_yaml_file(path)
                .with_context(|| format!("Failed to load credentials: {}", path.display())),
            None => Credentials::from_env().context("Failed to load credentials from environment"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ForecasterConfig::default();
        let plot = config.profile("plot").unwrap();
        assert_eq!(plot.lead_time_hours, 97);
        assert_eq!(plot.max_entries, 5);
        assert_eq!(plot.variables.len(), 7);
        assert_eq!(plot.selectors().len(), 2);

        let map = config.profile("map").unwrap();
        assert_eq!(map.output_dir, PathBuf::from("data/CDS-map"));
        assert_eq!(map.area.to_area(), [39.33, 9.02, 30.0, 45.0]);
        assert!(map.selectors().is_empty());

        assert!(config.profile("radar").is_err());
        assert_eq!(config.timezone().unwrap(), chrono_tz::Asia::Nicosia);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
timezone: UTC
profiles:
  plot:
    output_dir: /tmp/forecasts
    max_entries: 3
    lead_time_hours: 49
    lead_time_step_hours: 3
    variables: [dust, ozone]
    area: { north: 36.0, west: 32.0, south: 34.0, east: 35.0 }
    regions:
      - { name: Nicosia, lat: [35.1, 35.2], lon: [33.3, 33.4] }
      - { name: Larnaca, lat: 34.92, lon: 33.63 }
    stations: true
"#;

        let config: ForecasterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timezone().unwrap(), chrono_tz::UTC);
        assert_eq!(config.profiles.len(), 1);

        let plot = config.profile("plot").unwrap();
        assert_eq!(plot.prefix, "CDS");
        assert_eq!(plot.regions.len(), 2);
        assert!(plot.regions[1].extent.is_point());

        let request = plot.request(DateRange::today());
        assert_eq!(request.expected_steps(), 17);
        assert_eq!(request.variables, vec!["dust", "ozone"]);

        let cache = plot.cache_config(true);
        assert_eq!(cache.max_entries, 3);
        assert!(cache.dry_run);

        let selectors = plot.selectors();
        assert_eq!(selectors.len(), 3);
        assert_eq!(selectors[0].name(), "Nicosia");
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/forecast.yaml");
        let config = ForecasterConfig::load(&path).unwrap();
        let defaults = ForecasterConfig::default();

        for name in ["plot", "map"] {
            let shipped = config.profile(name).unwrap();
            let builtin = defaults.profile(name).unwrap();
            assert_eq!(shipped.output_dir, builtin.output_dir);
            assert_eq!(shipped.variables, builtin.variables);
            assert_eq!(shipped.area, builtin.area);
            assert_eq!(shipped.regions, builtin.regions);
            assert_eq!(shipped.stations, builtin.stations);
        }
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ForecasterConfig::load_or_default(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.profiles.len(), 2);
    }

    #[test]
    fn test_unknown_timezone() {
        let config = ForecasterConfig {
            timezone: "Europe/Atlantis".to_string(),
            ..Default::default()
        };
        assert!(config.timezone().is_err());
    }

    #[test]
    fn test_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.yaml");
        std::fs::write(&path, "url: https://ads.example.eu/api\nkey: abc\n").unwrap();

        let config = ForecasterConfig {
            credentials_file: Some(path),
            ..Default::default()
        };
        assert_eq!(config.credentials().unwrap().key, "abc");
    }
}
