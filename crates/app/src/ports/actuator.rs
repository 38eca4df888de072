//! Actuator port — the devices the sequencer drives.
//!
//! Implemented by the surrounding automation (the virtual adapter provides a
//! simulated one). The sequencer never talks to devices any other way.

use std::future::Future;
use std::time::Duration;

use heatsoak_domain::error::SoakError;
use heatsoak_domain::id::ZoneId;

/// Commands and lookups on the controlled zones.
pub trait Actuator {
    /// Whether the zone exists at all. Used by the start-up check.
    fn has_zone(&self, zone: &ZoneId) -> impl Future<Output = Result<bool, SoakError>> + Send;

    /// Whether the zone is currently in a condition that calls for a soak
    /// (e.g. its thermostat is in heat mode).
    fn needs_treatment(
        &self,
        zone: &ZoneId,
    ) -> impl Future<Output = Result<bool, SoakError>> + Send;

    /// Temporarily raise the zone's setpoint to `target_temp`.
    fn apply_override(
        &self,
        zone: &ZoneId,
        target_temp: f64,
    ) -> impl Future<Output = Result<(), SoakError>> + Send;

    /// Put the zone back to its resting setpoint `target_temp`.
    fn release(
        &self,
        zone: &ZoneId,
        target_temp: f64,
    ) -> impl Future<Output = Result<(), SoakError>> + Send;

    fn current_temperature(
        &self,
        zone: &ZoneId,
    ) -> impl Future<Output = Result<f64, SoakError>> + Send;

    /// Outdoor reference temperature, `None` when no sensor is available.
    fn outside_temperature(&self) -> impl Future<Output = Result<Option<f64>, SoakError>> + Send;

    /// Poll until the zone's `attribute` equals `expected` or `timeout`
    /// elapses. Returns whether the value settled in time.
    fn wait_for_attribute(
        &self,
        zone: &ZoneId,
        attribute: &str,
        expected: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<bool, SoakError>> + Send;
}

impl<T: Actuator + Send + Sync> Actuator for std::sync::Arc<T> {
    fn has_zone(&self, zone: &ZoneId) -> impl Future<Output = Result<bool, SoakError>> + Send {
        (**self).has_zone(zone)
    }

    fn needs_treatment(
        &self,
        zone: &ZoneId,
    ) -> impl Future<Output = Result<bool, SoakError>> + Send {
        (**self).needs_treatment(zone)
    }

    fn apply_override(
        &self,
        zone: &ZoneId,
        target_temp: f64,
    ) -> impl Future<Output = Result<(), SoakError>> + Send {
        (**self).apply_override(zone, target_temp)
    }

    fn release(
        &self,
        zone: &ZoneId,
        target_temp: f64,
    ) -> impl Future<Output = Result<(), SoakError>> + Send {
        (**self).release(zone, target_temp)
    }

    fn current_temperature(
        &self,
        zone: &ZoneId,
    ) -> impl Future<Output = Result<f64, SoakError>> + Send {
        (**self).current_temperature(zone)
    }

    fn outside_temperature(&self) -> impl Future<Output = Result<Option<f64>, SoakError>> + Send {
        (**self).outside_temperature()
    }

    fn wait_for_attribute(
        &self,
        zone: &ZoneId,
        attribute: &str,
        expected: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<bool, SoakError>> + Send {
        (**self).wait_for_attribute(zone, attribute, expected, timeout)
    }
}
