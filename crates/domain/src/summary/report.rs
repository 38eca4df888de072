//! Report row — one line of the append-only daily export.

use crate::forecast::ForecastSnapshot;
use crate::summary::ZoneSummary;
use crate::time::Timestamp;

/// Flattened view of one zone's day, ready for a tabular sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneReport {
    pub date: Option<Timestamp>,
    pub forecast_min_temp: Option<f64>,
    pub forecast_max_temp: Option<f64>,
    pub forecast_avg_temp: Option<f64>,
    pub forecast_total_solar_radiation: Option<f64>,
    pub forecast_avg_humidity: Option<f64>,
    pub zone_name: String,
    pub hvac_action: String,
    pub hvac_action_duration: f64,
    pub unplanned_hvac_action_events: usize,
    pub unplanned_hvac_action_duration: f64,
    pub zone_target_temp: f64,
    pub zone_starting_temp: Option<f64>,
    pub zone_completion_temp: Option<f64>,
    pub zone_post_completion_temp_1: Option<f64>,
    pub zone_post_completion_temp_2: Option<f64>,
    pub zone_final_temp: Option<f64>,
    /// Completion minus starting temperature.
    pub zone_temp_error: Option<f64>,
}

impl ZoneReport {
    /// Column names, in the order of [`values`](Self::values).
    pub const HEADERS: [&'static str; 18] = [
        "date",
        "forecast_min_temp",
        "forecast_max_temp",
        "forecast_avg_temp",
        "forecast_total_solar_radiation",
        "forecast_avg_humidity",
        "zone_name",
        "hvac_action",
        "hvac_action_duration",
        "unplanned_hvac_action_events",
        "unplanned_hvac_action_duration",
        "zone_target_temp",
        "zone_starting_temp",
        "zone_completion_temp",
        "zone_post_completion_temp_1",
        "zone_post_completion_temp_2",
        "zone_final_temp",
        "zone_temp_error",
    ];

    #[must_use]
    pub fn new(
        date: Option<Timestamp>,
        forecast: Option<&ForecastSnapshot>,
        zone: &ZoneSummary,
    ) -> Self {
        let records = &zone.temperature_records;
        Self {
            date,
            forecast_min_temp: forecast.and_then(|f| f.min_temperature),
            forecast_max_temp: forecast.and_then(|f| f.max_temperature),
            forecast_avg_temp: forecast.and_then(|f| f.avg_temperature),
            forecast_total_solar_radiation: forecast.and_then(|f| f.total_solar_radiation),
            forecast_avg_humidity: forecast.and_then(|f| f.avg_humidity),
            zone_name: zone.zone.to_string(),
            hvac_action: zone.hvac_action.to_string(),
            hvac_action_duration: zone.duration,
            unplanned_hvac_action_events: zone.unplanned_hvac_actions.len(),
            unplanned_hvac_action_duration: zone.unplanned_duration(),
            zone_target_temp: zone.target_temp,
            zone_starting_temp: zone.start_temp,
            zone_completion_temp: zone.end_temp,
            zone_post_completion_temp_1: records.first().map(|r| r.temperature),
            zone_post_completion_temp_2: records.get(1).map(|r| r.temperature),
            zone_final_temp: records.last().map(|r| r.temperature),
            zone_temp_error: zone.end_temp.zip(zone.start_temp).map(|(end, start)| end - start),
        }
    }

    /// Cell values as text; absent values become empty cells.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        fn opt(value: Option<f64>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        vec![
            self.date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            opt(self.forecast_min_temp),
            opt(self.forecast_max_temp),
            opt(self.forecast_avg_temp),
            opt(self.forecast_total_solar_radiation),
            opt(self.forecast_avg_humidity),
            self.zone_name.clone(),
            self.hvac_action.clone(),
            self.hvac_action_duration.to_string(),
            self.unplanned_hvac_action_events.to_string(),
            self.unplanned_hvac_action_duration.to_string(),
            self.zone_target_temp.to_string(),
            opt(self.zone_starting_temp),
            opt(self.zone_completion_temp),
            opt(self.zone_post_completion_temp_1),
            opt(self.zone_post_completion_temp_2),
            opt(self.zone_final_temp),
            opt(self.zone_temp_error),
        ]
    }
}
