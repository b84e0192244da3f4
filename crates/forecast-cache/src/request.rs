//! Forecast retrieval requests.

use aq_common::species::DEFAULT_VARIABLES;
use aq_common::{BoundingBox, DateRange};
use serde_json::{json, Value};

/// Dataset requested by default.
pub const DEFAULT_DATASET: &str = "cams-europe-air-quality-forecasts";

/// One forecast request: what to fetch, where, and for which dates.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub dataset: String,
    pub variables: Vec<String>,
    pub bounding_box: BoundingBox,
    pub date_range: DateRange,
    /// Forecast horizon; lead times run over `0..lead_time_hours`.
    pub lead_time_hours: u32,
    pub lead_time_step_hours: u32,
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            variables: DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect(),
            bounding_box: BoundingBox::default(),
            date_range: DateRange::today(),
            lead_time_hours: 97,
            lead_time_step_hours: 1,
        }
    }
}

impl ForecastRequest {
    pub fn for_dates(date_range: DateRange) -> Self {
        Self {
            date_range,
            ..Default::default()
        }
    }

    /// Requested lead times in hours.
    pub fn lead_times(&self) -> Vec<u32> {
        (0..self.lead_time_hours)
            .step_by(self.lead_time_step_hours.max(1) as usize)
            .collect()
    }

    /// Number of time steps a complete cache entry holds.
    pub fn expected_steps(&self) -> usize {
        self.lead_times().len()
    }

    /// Request body inputs for the retrieve API.
    pub fn to_inputs(&self, data_format: &str) -> Value {
        let lead_times: Vec<String> = self.lead_times().iter().map(u32::to_string).collect();
        json!({
            "model": "ensemble",
            "type": "forecast",
            "level": "0",
            "time": "00:00",
            "date": self.date_range.to_string(),
            "leadtime_hour": lead_times,
            "variable": self.variables,
            "area": self.bounding_box.to_area(),
            "data_format": data_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_default_horizon() {
        let request = ForecastRequest::default();
        assert_eq!(request.expected_steps(), 97);
        assert_eq!(request.lead_times().first(), Some(&0));
        assert_eq!(request.lead_times().last(), Some(&96));
    }

    #[test]
    fn test_stepped_lead_times() {
        let request = ForecastRequest {
            lead_time_hours: 97,
            lead_time_step_hours: 3,
            ..Default::default()
        };
        assert_eq!(request.expected_steps(), 33);
        assert_eq!(request.lead_times()[1], 3);
    }

    #[test]
    fn test_inputs() {
        let date = NaiveDate::from_ymd_opt(2022, 4, 9).unwrap();
        let request = ForecastRequest {
            variables: vec!["dust".to_string()],
            lead_time_hours: 3,
            ..ForecastRequest::for_dates(DateRange::single(date))
        };

        let inputs = request.to_inputs("netcdf");
        assert_eq!(inputs["date"], "2022-04-09/2022-04-09");
        assert_eq!(inputs["leadtime_hour"], json!(["0", "1", "2"]));
        assert_eq!(inputs["variable"], json!(["dust"]));
        assert_eq!(inputs["area"], json!([36.54, 30.24, 33.63, 36.43]));
        assert_eq!(inputs["data_format"], "netcdf");
    }
}
