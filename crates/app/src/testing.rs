//! In-memory fakes of the ports, shared by the unit tests of this crate.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use heatsoak_domain::error::{NotFoundError, SoakError};
use heatsoak_domain::forecast::ForecastSnapshot;
use heatsoak_domain::id::ZoneId;
use heatsoak_domain::summary::ZoneReport;
use heatsoak_domain::time::Timestamp;

use crate::ports::{Actuator, ForecastSource, JobStore, ReportSink};

// ── In-memory job store ────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryJobStore {
    store: Mutex<BTreeMap<String, String>>,
}

impl InMemoryJobStore {
    pub fn keys(&self) -> Vec<String> {
        self.store.lock().unwrap().keys().cloned().collect()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.store.lock().unwrap().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.store
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

impl JobStore for InMemoryJobStore {
    fn put(&self, key: &str, value: String) -> impl Future<Output = Result<(), SoakError>> + Send {
        self.store.lock().unwrap().insert(key.to_string(), value);
        async { Ok(()) }
    }

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, SoakError>> + Send {
        let result = self.store.lock().unwrap().get(key).cloned();
        async { Ok(result) }
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), SoakError>> + Send {
        self.store.lock().unwrap().remove(key);
        async { Ok(()) }
    }

    fn iterate_keys(&self) -> impl Future<Output = Result<Vec<String>, SoakError>> + Send {
        let result = self.keys();
        async { Ok(result) }
    }
}

// ── Fake actuator ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Override(ZoneId, f64),
    Release(ZoneId, f64),
}

#[derive(Debug)]
struct FakeZone {
    needs_treatment: bool,
    temperature: Option<f64>,
}

#[derive(Debug, Default)]
struct ActuatorState {
    zones: HashMap<ZoneId, FakeZone>,
    outside: Option<f64>,
    commands: Vec<Command>,
    settles: bool,
}

/// Records every command and answers lookups from canned values.
#[derive(Debug, Clone, Default)]
pub struct FakeActuator {
    state: Arc<Mutex<ActuatorState>>,
}

impl FakeActuator {
    pub fn with_zones(zones: &[(&'static str, bool, f64)]) -> Self {
        let actuator = Self::default();
        {
            let mut state = actuator.state.lock().unwrap();
            state.settles = true;
            state.outside = Some(-5.0);
            for (zone, needs_treatment, temperature) in zones {
                state.zones.insert(
                    ZoneId::from(*zone),
                    FakeZone {
                        needs_treatment: *needs_treatment,
                        temperature: Some(*temperature),
                    },
                );
            }
        }
        actuator
    }

    pub fn set_temperature(&self, zone: &'static str, temperature: f64) {
        let mut state = self.state.lock().unwrap();
        if let Some(fake) = state.zones.get_mut(&ZoneId::from(zone)) {
            fake.temperature = Some(temperature);
        }
    }

    /// Make temperature lookups on `zone` fail.
    pub fn break_sensor(&self, zone: &'static str) {
        let mut state = self.state.lock().unwrap();
        if let Some(fake) = state.zones.get_mut(&ZoneId::from(zone)) {
            fake.temperature = None;
        }
    }

    pub fn set_settles(&self, settles: bool) {
        self.state.lock().unwrap().settles = settles;
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state.lock().unwrap().commands.clone()
    }

    fn lookup<T>(&self, zone: &ZoneId, f: impl FnOnce(&FakeZone) -> T) -> Result<T, SoakError> {
        let state = self.state.lock().unwrap();
        state
            .zones
            .get(zone)
            .map(f)
            .ok_or_else(|| NotFoundError::zone(zone).into())
    }
}

impl Actuator for FakeActuator {
    fn has_zone(&self, zone: &ZoneId) -> impl Future<Output = Result<bool, SoakError>> + Send {
        let result = self.state.lock().unwrap().zones.contains_key(zone);
        async move { Ok(result) }
    }

    fn needs_treatment(
        &self,
        zone: &ZoneId,
    ) -> impl Future<Output = Result<bool, SoakError>> + Send {
        let result = self.lookup(zone, |fake| fake.needs_treatment);
        async move { result }
    }

    fn apply_override(
        &self,
        zone: &ZoneId,
        target_temp: f64,
    ) -> impl Future<Output = Result<(), SoakError>> + Send {
        self.state
            .lock()
            .unwrap()
            .commands
            .push(Command::Override(zone.clone(), target_temp));
        async { Ok(()) }
    }

    fn release(
        &self,
        zone: &ZoneId,
        target_temp: f64,
    ) -> impl Future<Output = Result<(), SoakError>> + Send {
        self.state
            .lock()
            .unwrap()
            .commands
            .push(Command::Release(zone.clone(), target_temp));
        async { Ok(()) }
    }

    fn current_temperature(
        &self,
        zone: &ZoneId,
    ) -> impl Future<Output = Result<f64, SoakError>> + Send {
        let result = self
            .lookup(zone, |fake| fake.temperature)
            .and_then(|temperature| {
                temperature.ok_or_else(|| SoakError::Actuator("sensor unavailable".into()))
            });
        async move { result }
    }

    fn outside_temperature(&self) -> impl Future<Output = Result<Option<f64>, SoakError>> + Send {
        let result = self.state.lock().unwrap().outside;
        async move { Ok(result) }
    }

    fn wait_for_attribute(
        &self,
        _zone: &ZoneId,
        _attribute: &str,
        _expected: &str,
        _timeout: Duration,
    ) -> impl Future<Output = Result<bool, SoakError>> + Send {
        let result = self.state.lock().unwrap().settles;
        async move { Ok(result) }
    }
}

// ── Fake forecast ──────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FakeForecast {
    pub window: Option<Timestamp>,
    pub snapshot: Option<ForecastSnapshot>,
    pub failing: bool,
}

impl ForecastSource for FakeForecast {
    fn best_window(
        &self,
        _duration_minutes: u64,
    ) -> impl Future<Output = Result<Option<Timestamp>, SoakError>> + Send {
        let result = if self.failing {
            Err(SoakError::Actuator("forecast unavailable".into()))
        } else {
            Ok(self.window)
        };
        async move { result }
    }

    fn daily_summary(
        &self,
    ) -> impl Future<Output = Result<Option<ForecastSnapshot>, SoakError>> + Send {
        let result = if self.failing {
            Err(SoakError::Actuator("forecast unavailable".into()))
        } else {
            Ok(self.snapshot.clone())
        };
        async move { result }
    }
}

// ── Memory sink ────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    rows: Arc<Mutex<Vec<ZoneReport>>>,
    appends: Arc<Mutex<usize>>,
    fail_next: Arc<Mutex<bool>>,
}

impl MemorySink {
    pub fn rows(&self) -> Vec<ZoneReport> {
        self.rows.lock().unwrap().clone()
    }

    pub fn appends(&self) -> usize {
        *self.appends.lock().unwrap()
    }

    /// Make the next `append` fail without recording anything.
    pub fn fail_next_append(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

impl ReportSink for MemorySink {
    fn append(&self, rows: &[ZoneReport]) -> impl Future<Output = Result<(), SoakError>> + Send {
        if std::mem::take(&mut *self.fail_next.lock().unwrap()) {
            return std::future::ready(Err(SoakError::Export("disk full".into())));
        }
        self.rows.lock().unwrap().extend_from_slice(rows);
        *self.appends.lock().unwrap() += 1;
        std::future::ready(Ok(()))
    }
}
