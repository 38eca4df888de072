//! Job record — durable descriptor of one deferred action.
//!
//! A job names its handler by a stable string rather than holding a closure,
//! so it can be re-materialized after the process restarts. The persisted
//! shape is:
//!
//! ```json
//! { "func": "complete_zone", "run_time": "2025-01-06T15:20:00Z", "kwargs": { "zone": "climate.ski_room" } }
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CorruptRecordError, SoakError};
use crate::time::Timestamp;

/// Arguments handed to the handler when the job fires.
pub type JobPayload = serde_json::Map<String, serde_json::Value>;

/// Stable name of a registered job handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerId(String);

impl HandlerId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HandlerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "func")]
    pub handler: HandlerId,
    #[serde(rename = "run_time")]
    pub run_at: Timestamp,
    #[serde(rename = "kwargs", default)]
    pub payload: JobPayload,
}

impl JobRecord {
    /// Serialize to the persisted JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SoakError::Encode`] if the payload cannot be serialized.
    pub fn encode(&self) -> Result<String, SoakError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a persisted record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CorruptRecordError`] when the text is not a valid record,
    /// including timestamps without a UTC offset.
    pub fn decode(key: &str, raw: &str) -> Result<Self, CorruptRecordError> {
        serde_json::from_str(raw).map_err(|source| CorruptRecordError {
            key: key.to_string(),
            source,
        })
    }
}

/// Turn a typed payload into the generic map stored in a [`JobRecord`].
///
/// # Errors
///
/// Returns [`SoakError::Encode`] when `value` does not serialize to a JSON object.
pub fn to_payload<T: Serialize>(value: &T) -> Result<JobPayload, SoakError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(SoakError::Encode(serde::ser::Error::custom(format!(
            "payload must be an object, got {other}"
        )))),
    }
}

/// Decode a typed payload out of a fired job.
///
/// # Errors
///
/// Returns [`CorruptRecordError`] when the stored arguments do not match `T`.
pub fn from_payload<T: DeserializeOwned>(
    handler: &str,
    payload: JobPayload,
) -> Result<T, CorruptRecordError> {
    serde_json::from_value(serde_json::Value::Object(payload)).map_err(|source| {
        CorruptRecordError {
            key: handler.to_string(),
            source,
        }
    })
}
