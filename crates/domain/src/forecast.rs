//! Forecast snapshot — weather context stored alongside a day's summary.
//!
//! The snapshot is produced by the forecast source and only stored here.
//! The fields the daily report needs are typed; anything else the source
//! provides is kept verbatim in [`ForecastSnapshot::extra`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    #[serde(default)]
    pub min_temperature: Option<f64>,
    #[serde(default)]
    pub max_temperature: Option<f64>,
    #[serde(default)]
    pub avg_temperature: Option<f64>,
    #[serde(default)]
    pub total_solar_radiation: Option<f64>,
    #[serde(default)]
    pub avg_humidity: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
