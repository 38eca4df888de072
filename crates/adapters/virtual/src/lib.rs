//! # heatsoak-adapter-virtual
//!
//! Simulated climate zones for demos, dry runs and end-to-end tests.
//!
//! ## Provided pieces
//!
//! | Type | Port | Behaviour |
//! |------|------|-----------|
//! | [`VirtualClimate`] | `Actuator` | Thermostats whose action follows setpoint vs temperature |
//! | [`FixedForecast`] | `ForecastSource` | Returns a preset window and snapshot |
//!
//! Every change of a thermostat's action is published as an `HvacActivity`,
//! the way a real climate integration reports state changes.
//!
//! ## Dependency rule
//!
//! Depends on `heatsoak-app` (port traits) and `heatsoak-domain` only.

mod forecast;
mod thermostat;

pub use forecast::FixedForecast;
pub use thermostat::{HvacMode, VirtualThermostat};

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::Mutex;

use heatsoak_app::ports::{ActivityPublisher, Actuator};
use heatsoak_domain::error::{NotFoundError, SoakError};
use heatsoak_domain::hvac::{HvacAction, HvacActivity};
use heatsoak_domain::id::ZoneId;
use heatsoak_domain::time::now;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Simulated thermostats keyed by zone.
pub struct VirtualClimate<P> {
    thermostats: Mutex<BTreeMap<ZoneId, VirtualThermostat>>,
    outside_temperature: Mutex<Option<f64>>,
    publisher: P,
}

impl<P> VirtualClimate<P>
where
    P: ActivityPublisher + Send + Sync,
{
    #[must_use]
    pub fn new(publisher: P) -> Self {
        Self {
            thermostats: Mutex::new(BTreeMap::new()),
            outside_temperature: Mutex::new(None),
            publisher,
        }
    }

    #[must_use]
    pub fn with_thermostat(mut self, zone: ZoneId, thermostat: VirtualThermostat) -> Self {
        self.thermostats.get_mut().insert(zone, thermostat);
        self
    }

    #[must_use]
    pub fn with_outside_temperature(mut self, temperature: f64) -> Self {
        *self.outside_temperature.get_mut() = Some(temperature);
        self
    }

    /// Snapshot of a zone's thermostat.
    pub async fn thermostat(&self, zone: &ZoneId) -> Option<VirtualThermostat> {
        self.thermostats.lock().await.get(zone).cloned()
    }

    /// Simulate the room warming up or cooling down.
    ///
    /// # Errors
    ///
    /// Returns [`SoakError::NotFound`] for an unknown zone.
    pub async fn set_temperature(&self, zone: &ZoneId, temperature: f64) -> Result<(), SoakError> {
        self.update(zone, |thermostat| {
            thermostat.set_current_temperature(temperature)
        })
        .await
    }

    /// Simulate someone touching the thermostat's setpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SoakError::NotFound`] for an unknown zone.
    pub async fn set_setpoint(&self, zone: &ZoneId, setpoint: f64) -> Result<(), SoakError> {
        self.update(zone, |thermostat| thermostat.set_setpoint(setpoint))
            .await
    }

    async fn update(
        &self,
        zone: &ZoneId,
        change: impl FnOnce(&mut VirtualThermostat) -> Option<HvacAction>,
    ) -> Result<(), SoakError> {
        let activity = {
            let mut thermostats = self.thermostats.lock().await;
            let thermostat = thermostats
                .get_mut(zone)
                .ok_or_else(|| NotFoundError::zone(zone))?;
            change(thermostat).map(|from| HvacActivity {
                zone: zone.clone(),
                from,
                to: thermostat.hvac_action,
                at: now(),
            })
        };

        if let Some(activity) = activity {
            tracing::debug!(zone = %zone, from = %activity.from, to = %activity.to, "virtual hvac action changed");
            self.publisher.publish(activity).await?;
        }
        Ok(())
    }

    async fn read<T>(
        &self,
        zone: &ZoneId,
        read: impl FnOnce(&VirtualThermostat) -> T,
    ) -> Result<T, SoakError> {
        let thermostats = self.thermostats.lock().await;
        let thermostat = thermostats
            .get(zone)
            .ok_or_else(|| NotFoundError::zone(zone))?;
        Ok(read(thermostat))
    }
}

impl<P> Actuator for VirtualClimate<P>
where
    P: ActivityPublisher + Send + Sync,
{
    async fn has_zone(&self, zone: &ZoneId) -> Result<bool, SoakError> {
        Ok(self.thermostats.lock().await.contains_key(zone))
    }

    async fn needs_treatment(&self, zone: &ZoneId) -> Result<bool, SoakError> {
        self.read(zone, |thermostat| thermostat.hvac_mode == HvacMode::Heat)
            .await
    }

    async fn apply_override(&self, zone: &ZoneId, target_temp: f64) -> Result<(), SoakError> {
        tracing::info!(zone = %zone, target_temp, "virtual override applied");
        self.set_setpoint(zone, target_temp).await
    }

    async fn release(&self, zone: &ZoneId, target_temp: f64) -> Result<(), SoakError> {
        tracing::info!(zone = %zone, target_temp, "virtual override released");
        self.set_setpoint(zone, target_temp).await
    }

    async fn current_temperature(&self, zone: &ZoneId) -> Result<f64, SoakError> {
        self.read(zone, |thermostat| thermostat.current_temperature)
            .await
    }

    async fn outside_temperature(&self) -> Result<Option<f64>, SoakError> {
        Ok(*self.outside_temperature.lock().await)
    }

    async fn wait_for_attribute(
        &self,
        zone: &ZoneId,
        attribute: &str,
        expected: &str,
        timeout: Duration,
    ) -> Result<bool, SoakError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let value = self
                .read(zone, |thermostat| thermostat.attribute(attribute))
                .await?;
            if value.as_deref() == Some(expected) {
                return Ok(true);
            }
            let current = tokio::time::Instant::now();
            if current >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - current)).await;
        }
    }
}
