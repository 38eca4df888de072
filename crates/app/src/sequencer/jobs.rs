//! Handlers the sequencer registers with the scheduler, and their payloads.

use serde::{Deserialize, Serialize};

use heatsoak_domain::id::{JobId, ZoneId};

use crate::scheduler::HandlerRegistry;

/// Fixed id of the day's `begin_run` job.
pub const BEGIN_RUN_JOB: &str = "daily:begin";
/// Fixed id of the day's `finalize_day` job.
pub const FINALIZE_DAY_JOB: &str = "daily:finalize";
/// Fixed id of the next `plan_day` job.
pub const PLAN_DAY_JOB: &str = "daily:plan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoakJob {
    BeginRun,
    CompleteZone,
    SampleTemperature,
    FinalizeDay,
    PlanDay,
}

impl SoakJob {
    pub const ALL: [Self; 5] = [
        Self::BeginRun,
        Self::CompleteZone,
        Self::SampleTemperature,
        Self::FinalizeDay,
        Self::PlanDay,
    ];

    /// Name persisted in job records. Never rename one of these.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::BeginRun => "begin_run",
            Self::CompleteZone => "complete_zone",
            Self::SampleTemperature => "sample_temperature",
            Self::FinalizeDay => "finalize_day",
            Self::PlanDay => "plan_day",
        }
    }

    #[must_use]
    pub fn registry() -> HandlerRegistry<Self> {
        Self::ALL
            .into_iter()
            .fold(HandlerRegistry::new(), |registry, job| {
                registry.with(job.name(), job)
            })
    }
}

/// Arguments of a `complete_zone` job. Carries everything needed to finish
/// the zone after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionPayload {
    pub zone: ZoneId,
    /// Whether the override command was actually sent.
    pub override_applied: bool,
}

/// Arguments of a `sample_temperature` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePayload {
    pub zone: ZoneId,
}

pub(crate) fn fixed(id: &'static str) -> JobId {
    JobId::from(id)
}
