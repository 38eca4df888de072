//! Phases of a soak run — per zone and for the whole queue.

use serde::{Deserialize, Serialize};

use crate::id::ZoneId;

/// Where one zone stands in the day's procedure.
///
/// ```text
/// Pending ─▶ Heating ─▶ Released ─▶ Monitoring ─▶ Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZonePhase {
    /// Queued, not started.
    Pending,
    /// Override applied (or suppressed in dry run), completion job armed.
    Heating,
    /// Restore command issued, the device may still be catching up.
    Released,
    /// Post-release temperature samples still pending.
    Monitoring,
    Done,
}

/// Global position of the sequencer cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum RunState {
    #[default]
    Idle,
    Running {
        current: Option<ZoneId>,
    },
    AllProcessed,
}

impl RunState {
    /// Zone whose completion job is currently pending, if any.
    #[must_use]
    pub fn current(&self) -> Option<&ZoneId> {
        match self {
            Self::Running { current } => current.as_ref(),
            _ => None,
        }
    }
}
