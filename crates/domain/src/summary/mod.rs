//! Daily summary — everything that happened to each zone during one run.
//!
//! The summary is the aggregate root of a day: it is opened by
//! [`DailySummary::set_start_time`], mutated as zones are processed and
//! observed, and finally turned into [`ZoneReport`] rows before being reset.
//! Zones keep their insertion order, which is the processing order.

mod report;
mod zone;

pub use report::ZoneReport;
pub use zone::{
    TemperatureRecord, UnplannedClose, UnplannedHvacAction, ZoneSummary, ZoneSummaryBuilder,
};

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::NotFoundError;
use crate::forecast::ForecastSnapshot;
use crate::hvac::HvacAction;
use crate::id::ZoneId;
use crate::time::Timestamp;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: Option<Timestamp>,
    pub forecast: Option<ForecastSnapshot>,
    #[serde(default)]
    pub zones: ZoneMap,
}

impl DailySummary {
    /// Whether a day has been started and not yet finalized.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.date.is_some()
    }

    /// Begin a new day. Returns `false` (and changes nothing) when a day is
    /// already in progress.
    pub fn set_start_time(&mut self, at: Timestamp) -> bool {
        if self.is_open() {
            return false;
        }
        self.date = Some(at);
        true
    }

    pub fn set_forecast(&mut self, forecast: Option<ForecastSnapshot>) {
        self.forecast = forecast;
    }

    /// Record a started zone, replacing any previous record for it.
    pub fn start_zone(&mut self, zone: ZoneSummary) {
        self.zones.insert(zone);
    }

    /// Mark a zone completed with its measured end temperature.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when the zone was never started.
    pub fn complete_zone(
        &mut self,
        zone: &ZoneId,
        end_temp: Option<f64>,
    ) -> Result<&ZoneSummary, NotFoundError> {
        let summary = self.zone_mut(zone)?;
        summary.end_temp = end_temp;
        summary.completed = true;
        Ok(summary)
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] when the zone was never started.
    pub fn start_unplanned_hvac_action(
        &mut self,
        zone: &ZoneId,
        action: HvacAction,
        at: Timestamp,
    ) -> Result<(), NotFoundError> {
        self.zone_mut(zone)?.add_unplanned_hvac_action(action, at);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] when the zone was never started.
    pub fn complete_unplanned_hvac_action(
        &mut self,
        zone: &ZoneId,
        at: Timestamp,
    ) -> Result<UnplannedClose, NotFoundError> {
        Ok(self.zone_mut(zone)?.finalize_unplanned_hvac_action(at))
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] when the zone was never started.
    pub fn add_delay_temperature(
        &mut self,
        zone: &ZoneId,
        temperature: f64,
        at: Timestamp,
    ) -> Result<TemperatureRecord, NotFoundError> {
        Ok(self.zone_mut(zone)?.add_end_temperature(temperature, at))
    }

    #[must_use]
    pub fn zone(&self, zone: &ZoneId) -> Option<&ZoneSummary> {
        self.zones.get(zone)
    }

    fn zone_mut(&mut self, zone: &ZoneId) -> Result<&mut ZoneSummary, NotFoundError> {
        self.zones
            .get_mut(zone)
            .ok_or_else(|| NotFoundError::zone(zone))
    }

    /// Zones recorded so far, in processing order.
    pub fn started_zones(&self) -> impl Iterator<Item = &ZoneId> {
        self.zones.iter().map(|summary| &summary.zone)
    }

    pub fn completed_zones(&self) -> impl Iterator<Item = &ZoneId> {
        self.zones
            .iter()
            .filter(|summary| summary.completed)
            .map(|summary| &summary.zone)
    }

    /// One export row per recorded zone.
    #[must_use]
    pub fn reports(&self) -> Vec<ZoneReport> {
        self.zones
            .iter()
            .map(|zone| ZoneReport::new(self.date, self.forecast.as_ref(), zone))
            .collect()
    }
}

impl fmt::Display for DailySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// Zone summaries keyed by zone, in insertion order.
///
/// Persisted as a JSON object whose key order is the processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneMap(Vec<ZoneSummary>);

impl ZoneMap {
    #[must_use]
    pub fn get(&self, zone: &ZoneId) -> Option<&ZoneSummary> {
        self.0.iter().find(|summary| &summary.zone == zone)
    }

    pub fn get_mut(&mut self, zone: &ZoneId) -> Option<&mut ZoneSummary> {
        self.0.iter_mut().find(|summary| &summary.zone == zone)
    }

    #[must_use]
    pub fn contains(&self, zone: &ZoneId) -> bool {
        self.get(zone).is_some()
    }

    /// Insert at the end, or replace in place when the zone is already known.
    pub fn insert(&mut self, summary: ZoneSummary) {
        match self.get_mut(&summary.zone) {
            Some(existing) => *existing = summary,
            None => self.0.push(summary),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ZoneSummary> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a ZoneMap {
    type Item = &'a ZoneSummary;
    type IntoIter = std::slice::Iter<'a, ZoneSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for ZoneMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for summary in &self.0 {
            map.serialize_entry(summary.zone.as_str(), summary)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ZoneMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ZoneMapVisitor;

        impl<'de> Visitor<'de> for ZoneMapVisitor {
            type Value = ZoneMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of zone id to zone summary")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ZoneMap, A::Error> {
                let mut zones = ZoneMap::default();
                while let Some((key, summary)) = access.next_entry::<String, ZoneSummary>()? {
                    if summary.zone.as_str() != key {
                        return Err(serde::de::Error::custom(format!(
                            "zone key '{key}' does not match record '{}'",
                            summary.zone
                        )));
                    }
                    zones.insert(summary);
                }
                Ok(zones)
            }
        }

        deserializer.deserialize_map(ZoneMapVisitor)
    }
}
