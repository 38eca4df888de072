//! HVAC actions and the activity transitions observed on a zone.

use serde::{Deserialize, Serialize};

use crate::id::ZoneId;
use crate::time::Timestamp;

/// What the zone's equipment is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacAction {
    #[default]
    Idle,
    Off,
    Heating,
    Cooling,
    Drying,
    Fan,
}

impl HvacAction {
    /// Whether the equipment is actively conditioning the zone.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Heating | Self::Cooling | Self::Drying | Self::Fan)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Off => "off",
            Self::Heating => "heating",
            Self::Cooling => "cooling",
            Self::Drying => "drying",
            Self::Fan => "fan",
        }
    }
}

impl std::fmt::Display for HvacAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of an observed change of [`HvacAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle → active.
    Started(HvacAction),
    /// Active → idle.
    Stopped,
    /// Anything else (active → active, idle → off, …).
    Other,
}

/// One externally observed change of a zone's HVAC action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HvacActivity {
    pub zone: ZoneId,
    pub from: HvacAction,
    pub to: HvacAction,
    pub at: Timestamp,
}

impl HvacActivity {
    #[must_use]
    pub fn transition(&self) -> Transition {
        match (self.from.is_active(), self.to.is_active()) {
            (false, true) => Transition::Started(self.to),
            (true, false) => Transition::Stopped,
            _ => Transition::Other,
        }
    }
}
