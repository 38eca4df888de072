//! Sequencer settings, passed in by the composition root.

use std::time::Duration;

use chrono::{Local, NaiveTime, TimeZone, Utc};

use heatsoak_domain::id::ZoneId;
use heatsoak_domain::time::Timestamp;

/// One configured zone, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonePlan {
    pub zone: ZoneId,
    /// Falls back to [`SequencerConfig::default_duration`] when unset.
    pub run_duration: Option<Duration>,
}

impl ZonePlan {
    #[must_use]
    pub fn new(zone: ZoneId) -> Self {
        Self {
            zone,
            run_duration: None,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.run_duration = Some(duration);
        self
    }
}

/// What completing a zone with a zero-length run does. The override is
/// never applied for such a zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroDurationPolicy {
    /// Leave the zone untouched.
    #[default]
    SkipRestore,
    /// Send the restore command anyway.
    AlwaysRestore,
}

#[derive(Debug, Clone)]
pub struct SequencerConfig {
    pub zones: Vec<ZonePlan>,
    pub default_duration: Duration,
    /// Upper bound on every run while quick-run mode is on.
    pub quick_run_duration: Duration,
    pub heat_to_temp: f64,
    pub restore_temp: f64,
    /// Delays after completion at which the zone temperature is sampled again.
    pub sample_delays: Vec<Duration>,
    pub quick_sample_delays: Vec<Duration>,
    /// Bound on each wait for the device to report the expected action.
    pub settle_timeout: Duration,
    pub zero_duration_policy: ZeroDurationPolicy,
    /// Local start time when the forecast source has no better window.
    pub default_run_at: NaiveTime,
    /// Local time at which the next day gets planned.
    pub plan_at: NaiveTime,
    /// Margin between the last expected sample and the end of the day.
    pub finalize_grace: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            zones: Vec::new(),
            default_duration: Duration::from_secs(20 * 60),
            quick_run_duration: Duration::from_secs(60),
            heat_to_temp: 19.5,
            restore_temp: 13.0,
            sample_delays: vec![Duration::from_secs(1800), Duration::from_secs(3600)],
            quick_sample_delays: vec![Duration::from_secs(30), Duration::from_secs(60)],
            settle_timeout: Duration::from_secs(30),
            zero_duration_policy: ZeroDurationPolicy::default(),
            default_run_at: NaiveTime::from_hms_opt(15, 0, 0).unwrap_or(NaiveTime::MIN),
            plan_at: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            finalize_grace: Duration::from_secs(600),
        }
    }
}

impl SequencerConfig {
    /// Run duration of `zone`, capped while quick-run mode is on.
    #[must_use]
    pub fn run_duration(&self, zone: &ZoneId, quick_run: bool) -> Duration {
        let configured = self
            .zones
            .iter()
            .find(|plan| &plan.zone == zone)
            .and_then(|plan| plan.run_duration)
            .unwrap_or(self.default_duration);
        if quick_run {
            configured.min(self.quick_run_duration)
        } else {
            configured
        }
    }

    #[must_use]
    pub fn sample_delays(&self, quick_run: bool) -> &[Duration] {
        if quick_run {
            &self.quick_sample_delays
        } else {
            &self.sample_delays
        }
    }

    /// Sum of the run durations of every configured zone.
    #[must_use]
    pub fn total_duration(&self, quick_run: bool) -> Duration {
        self.zones
            .iter()
            .map(|plan| self.run_duration(&plan.zone, quick_run))
            .sum()
    }
}

/// Next instant strictly after `now` whose local wall-clock time is `at`.
#[must_use]
pub fn next_local_time(now: Timestamp, at: NaiveTime) -> Timestamp {
    now.with_timezone(&Local)
        .date_naive()
        .iter_days()
        .take(3)
        .filter_map(|day| Local.from_local_datetime(&day.and_time(at)).earliest())
        .map(|candidate| candidate.with_timezone(&Utc))
        .find(|candidate| *candidate > now)
        .unwrap_or(now + chrono::Duration::days(1))
}
