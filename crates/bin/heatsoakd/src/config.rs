//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `heatsoak.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use chrono::NaiveTime;
use serde::Deserialize;

use heatsoak_app::ports::SharedModes;
use heatsoak_app::sequencer::{SequencerConfig, ZeroDurationPolicy, ZonePlan};
use heatsoak_domain::id::ZoneId;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Job store settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Daily export settings.
    pub report: ReportConfig,
    /// Temperatures, durations and sampling of a zone run.
    pub soak: SoakConfig,
    /// Daily planning times.
    pub schedule: ScheduleConfig,
    /// Initial mode flags.
    pub modes: ModesConfig,
    /// Zones in processing order.
    pub zones: Vec<ZoneConfig>,
    /// Simulated thermostats.
    #[serde(rename = "virtual")]
    pub simulation: VirtualConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// CSV file the finished days are appended to.
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SoakConfig {
    pub heat_to_temp: f64,
    pub restore_temp: f64,
    pub default_duration_secs: u64,
    pub quick_run_duration_secs: u64,
    pub sample_delays_secs: Vec<u64>,
    pub quick_sample_delays_secs: Vec<u64>,
    pub settle_timeout_secs: u64,
    pub zero_duration_restore: ZeroDurationRestore,
}

/// What to do on completion of a zone configured with a zero duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroDurationRestore {
    #[default]
    Skip,
    Always,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Local start time (`HH:MM`) when the forecast has no better window.
    pub default_run_at: String,
    /// Local time (`HH:MM`) at which the next day is planned.
    pub plan_at: String,
    pub finalize_grace_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModesConfig {
    pub dry_run: bool,
    pub quick_run: bool,
    pub disabled: bool,
    pub away_mode: bool,
}

/// One `[[zones]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneConfig {
    pub id: String,
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    /// Starting temperature of thermostats without an explicit one.
    pub default_temperature: f64,
    pub outside_temperature: Option<f64>,
    /// Starting temperature per zone id.
    pub temperatures: BTreeMap<String, f64>,
}

impl Config {
    /// Load configuration from `heatsoak.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("heatsoak.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HEATSOAK_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("HEATSOAK_REPORT_PATH") {
            self.report.path = val;
        }
        if let Ok(val) = std::env::var("HEATSOAK_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(flag) = std::env::var("HEATSOAK_DRY_RUN").ok().and_then(|v| parse_flag(&v)) {
            self.modes.dry_run = flag;
        }
        if let Some(flag) = std::env::var("HEATSOAK_QUICK_RUN").ok().and_then(|v| parse_flag(&v)) {
            self.modes.quick_run = flag;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.report.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "report path must not be empty".to_string(),
            ));
        }
        if !self.soak.heat_to_temp.is_finite() || !self.soak.restore_temp.is_finite() {
            return Err(ConfigError::Validation(
                "temperatures must be finite numbers".to_string(),
            ));
        }
        parse_time("default_run_at", &self.schedule.default_run_at)?;
        parse_time("plan_at", &self.schedule.plan_at)?;

        let mut seen = HashSet::new();
        for zone in &self.zones {
            if zone.id.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "zone id must not be empty".to_string(),
                ));
            }
            if !seen.insert(zone.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "zone '{}' is configured twice",
                    zone.id
                )));
            }
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Configured zone ids, in processing order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an empty id.
    pub fn zone_ids(&self) -> Result<Vec<ZoneId>, ConfigError> {
        self.zones
            .iter()
            .map(|zone| {
                zone.id
                    .parse()
                    .map_err(|_| ConfigError::Validation("zone id must not be empty".to_string()))
            })
            .collect()
    }

    /// Settings of the zone sequencer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an unparsable time of day or
    /// an empty zone id.
    pub fn sequencer(&self) -> Result<SequencerConfig, ConfigError> {
        let zones = self
            .zone_ids()?
            .into_iter()
            .zip(&self.zones)
            .map(|(zone, entry)| match entry.duration_secs {
                Some(secs) => ZonePlan::new(zone).with_duration(Duration::from_secs(secs)),
                None => ZonePlan::new(zone),
            })
            .collect();

        Ok(SequencerConfig {
            zones,
            default_duration: Duration::from_secs(self.soak.default_duration_secs),
            quick_run_duration: Duration::from_secs(self.soak.quick_run_duration_secs),
            heat_to_temp: self.soak.heat_to_temp,
            restore_temp: self.soak.restore_temp,
            sample_delays: seconds(&self.soak.sample_delays_secs),
            quick_sample_delays: seconds(&self.soak.quick_sample_delays_secs),
            settle_timeout: Duration::from_secs(self.soak.settle_timeout_secs),
            zero_duration_policy: match self.soak.zero_duration_restore {
                ZeroDurationRestore::Skip => ZeroDurationPolicy::SkipRestore,
                ZeroDurationRestore::Always => ZeroDurationPolicy::AlwaysRestore,
            },
            default_run_at: parse_time("default_run_at", &self.schedule.default_run_at)?,
            plan_at: parse_time("plan_at", &self.schedule.plan_at)?,
            finalize_grace: Duration::from_secs(self.schedule.finalize_grace_secs),
        })
    }
}

impl ModesConfig {
    /// Shared flags seeded with the configured values.
    #[must_use]
    pub fn shared(&self) -> SharedModes {
        SharedModes::new(self.dry_run, self.quick_run, self.disabled, self.away_mode)
    }
}

impl VirtualConfig {
    #[must_use]
    pub fn temperature_of(&self, zone: &ZoneId) -> f64 {
        self.temperatures
            .get(zone.as_str())
            .copied()
            .unwrap_or(self.default_temperature)
    }
}

fn seconds(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_secs).collect()
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ConfigError::Validation(format!("{field} must be a HH:MM time, got '{value}'")))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:heatsoak.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "heatsoakd=info,heatsoak_app=info,heatsoak_adapter_virtual=info".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: "heatsoak_summary.csv".to_string(),
        }
    }
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            heat_to_temp: 19.5,
            restore_temp: 13.0,
            default_duration_secs: 1200,
            quick_run_duration_secs: 60,
            sample_delays_secs: vec![1800, 3600],
            quick_sample_delays_secs: vec![30, 60],
            settle_timeout_secs: 30,
            zero_duration_restore: ZeroDurationRestore::Skip,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_run_at: "15:00".to_string(),
            plan_at: "08:00".to_string(),
            finalize_grace_secs: 600,
        }
    }
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            default_temperature: 12.0,
            outside_temperature: None,
            temperatures: BTreeMap::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
