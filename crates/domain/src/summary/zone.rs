//! Zone summary — one zone's record for the current day.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::hvac::HvacAction;
use crate::id::ZoneId;
use crate::time::{Timestamp, seconds_between};

/// Temperature sampled after the zone was released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    pub temperature: f64,
    pub timestamp: Timestamp,
    pub seconds_after_end: f64,
}

/// HVAC activity that started or stopped outside the scheduler's control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnplannedHvacAction {
    pub hvac_action: HvacAction,
    pub start_time: Timestamp,
    #[serde(default)]
    pub end_time: Option<Timestamp>,
    /// Seconds, set once the action is closed.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub completed: bool,
}

/// Result of closing the most recent unplanned action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnplannedClose {
    Closed { duration: f64 },
    AlreadyCompleted,
    NothingOpen,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub zone: ZoneId,
    pub start_time: Timestamp,
    /// Planned end of the override.
    pub end_time: Timestamp,
    pub hvac_action: HvacAction,
    pub target_temp: f64,
    /// Planned run duration in seconds.
    pub duration: f64,
    pub start_temp: Option<f64>,
    pub outside_temp: Option<f64>,
    pub end_temp: Option<f64>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub override_applied: bool,
    #[serde(default)]
    pub temperature_records: Vec<TemperatureRecord>,
    #[serde(default)]
    pub unplanned_hvac_actions: Vec<UnplannedHvacAction>,
}

impl ZoneSummary {
    /// Create a builder for constructing a [`ZoneSummary`].
    #[must_use]
    pub fn builder() -> ZoneSummaryBuilder {
        ZoneSummaryBuilder::default()
    }

    /// Record a post-completion sample, timed relative to the planned end.
    pub fn add_end_temperature(
        &mut self,
        temperature: f64,
        timestamp: Timestamp,
    ) -> TemperatureRecord {
        let record = TemperatureRecord {
            temperature,
            timestamp,
            seconds_after_end: seconds_between(self.end_time, timestamp),
        };
        self.temperature_records.push(record.clone());
        record
    }

    pub fn add_unplanned_hvac_action(&mut self, hvac_action: HvacAction, start_time: Timestamp) {
        self.unplanned_hvac_actions.push(UnplannedHvacAction {
            hvac_action,
            start_time,
            end_time: None,
            duration: None,
            completed: false,
        });
    }

    /// Close the most recent unplanned action if it is still open.
    ///
    /// The duration is floored at zero so clock skew between the observer
    /// and this process never yields a negative value.
    pub fn finalize_unplanned_hvac_action(&mut self, end_time: Timestamp) -> UnplannedClose {
        let Some(action) = self.unplanned_hvac_actions.last_mut() else {
            return UnplannedClose::NothingOpen;
        };
        if action.completed {
            return UnplannedClose::AlreadyCompleted;
        }
        let duration = seconds_between(action.start_time, end_time).max(0.0);
        action.end_time = Some(end_time);
        action.duration = Some(duration);
        action.completed = true;
        UnplannedClose::Closed { duration }
    }

    /// Sum of the durations of all closed unplanned actions, in seconds.
    #[must_use]
    pub fn unplanned_duration(&self) -> f64 {
        self.unplanned_hvac_actions
            .iter()
            .filter_map(|action| action.duration)
            .sum()
    }

}

/// Step-by-step builder for [`ZoneSummary`].
#[derive(Debug, Default)]
pub struct ZoneSummaryBuilder {
    zone: Option<ZoneId>,
    hvac_action: Option<HvacAction>,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
    target_temp: Option<f64>,
    start_temp: Option<f64>,
    outside_temp: Option<f64>,
    override_applied: bool,
}

impl ZoneSummaryBuilder {
    #[must_use]
    pub fn zone(mut self, zone: ZoneId) -> Self {
        self.zone = Some(zone);
        self
    }

    #[must_use]
    pub fn hvac_action(mut self, action: HvacAction) -> Self {
        self.hvac_action = Some(action);
        self
    }

    #[must_use]
    pub fn start_time(mut self, ts: Timestamp) -> Self {
        self.start_time = Some(ts);
        self
    }

    #[must_use]
    pub fn end_time(mut self, ts: Timestamp) -> Self {
        self.end_time = Some(ts);
        self
    }

    #[must_use]
    pub fn target_temp(mut self, temp: f64) -> Self {
        self.target_temp = Some(temp);
        self
    }

    #[must_use]
    pub fn start_temp(mut self, temp: Option<f64>) -> Self {
        self.start_temp = temp;
        self
    }

    #[must_use]
    pub fn outside_temp(mut self, temp: Option<f64>) -> Self {
        self.outside_temp = temp;
        self
    }

    #[must_use]
    pub fn override_applied(mut self, applied: bool) -> Self {
        self.override_applied = applied;
        self
    }

    /// Consume the builder, validate, and return a [`ZoneSummary`].
    ///
    /// A missing end time means a zero-length run.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] without a zone and
    /// [`ValidationError::NonFiniteTemperature`] for a NaN/infinite target.
    pub fn build(self) -> Result<ZoneSummary, ValidationError> {
        let zone = self.zone.ok_or(ValidationError::EmptyId)?;
        let target_temp = self.target_temp.unwrap_or_default();
        if !target_temp.is_finite() {
            return Err(ValidationError::NonFiniteTemperature);
        }
        let start_time = self.start_time.unwrap_or_else(crate::time::now);
        let end_time = self.end_time.unwrap_or(start_time).max(start_time);

        Ok(ZoneSummary {
            zone,
            start_time,
            end_time,
            hvac_action: self.hvac_action.unwrap_or(HvacAction::Heating),
            target_temp,
            duration: seconds_between(start_time, end_time),
            start_temp: self.start_temp,
            outside_temp: self.outside_temp,
            end_temp: None,
            completed: false,
            override_applied: self.override_applied,
            temperature_records: Vec::new(),
            unplanned_hvac_actions: Vec::new(),
        })
    }
}
