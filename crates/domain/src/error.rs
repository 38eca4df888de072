//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`SoakError`]
//! via `#[from]` (or through a boxed source for adapter errors).

/// Base error for every heatsoak operation.
#[derive(Debug, thiserror::Error)]
pub enum SoakError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Corrupt(#[from] CorruptRecordError),

    #[error("failed to encode record")]
    Encode(#[from] serde_json::Error),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("actuator error")]
    Actuator(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("export error")]
    Export(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A value that breaks a domain invariant.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("identifier must not be empty")]
    EmptyId,

    #[error("temperature must be a finite number")]
    NonFiniteTemperature,
}

/// A referenced item does not exist.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} '{id}' not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

impl NotFoundError {
    /// Shortcut for an unknown zone in the daily summary.
    #[must_use]
    pub fn zone(id: impl ToString) -> Self {
        Self {
            entity: "Zone",
            id: id.to_string(),
        }
    }
}

/// An operation was requested in a state that does not allow it.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StateError {
    #[error("a daily summary is still open, finalize the day first")]
    DayInProgress,

    #[error("zone '{0}' is still heating")]
    ZoneHeating(String),
}

/// A persisted record could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("record '{key}' could not be decoded")]
pub struct CorruptRecordError {
    pub key: String,
    #[source]
    pub source: serde_json::Error,
}
