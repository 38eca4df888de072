//! Persistence of the [`DailySummary`] under a single key of the job store.

use heatsoak_domain::error::{CorruptRecordError, SoakError};
use heatsoak_domain::summary::DailySummary;

use crate::ports::JobStore;

/// Reads and writes the whole daily summary as one JSON document.
///
/// Every save rewrites the full record; there are no partial updates.
pub struct SummaryStore<S> {
    store: S,
    key: String,
}

impl<S: JobStore> SummaryStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Load the persisted summary, or an empty one when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`SoakError::Corrupt`] when the stored text cannot be decoded,
    /// or a storage error.
    pub async fn load(&self) -> Result<DailySummary, SoakError> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(DailySummary::default());
        };
        serde_json::from_str(&raw).map_err(|source| {
            CorruptRecordError {
                key: self.key.clone(),
                source,
            }
            .into()
        })
    }

    /// Like [`load`](Self::load), but an undecodable record is logged and
    /// treated as absent.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn load_or_default(&self) -> Result<DailySummary, SoakError> {
        match self.load().await {
            Err(SoakError::Corrupt(err)) => {
                tracing::error!(key = %err.key, error = %err.source, "daily summary is corrupt, starting empty");
                Ok(DailySummary::default())
            }
            other => other,
        }
    }

    /// # Errors
    ///
    /// Returns an encoding or storage error.
    pub async fn save(&self, summary: &DailySummary) -> Result<(), SoakError> {
        let raw = serde_json::to_string(summary)?;
        self.store.put(&self.key, raw).await
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn clear(&self) -> Result<(), SoakError> {
        self.store.delete(&self.key).await
    }
}
