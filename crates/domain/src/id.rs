//! Typed identifier newtypes backed by strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_key {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Access the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.trim().is_empty() {
                    return Err(ValidationError::EmptyId);
                }
                Ok(Self(s.to_string()))
            }
        }

        impl From<&'static str> for $name {
            fn from(value: &'static str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_key!(
    /// Handle of one scheduled job, used both as storage key suffix and for cancellation.
    JobId
);

define_key!(
    /// Stable key of one controllable zone (e.g. `climate.main_floor`).
    ZoneId
);

impl Default for JobId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
