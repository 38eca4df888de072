//! Job store port — durable key/value persistence for pending work.
//!
//! One store instance is shared by the scheduler (job records) and the
//! summary store (the daily summary); keys are namespaced by purpose so they
//! never collide, see [`StoreKeys`].

use std::future::Future;

use heatsoak_domain::error::SoakError;
use heatsoak_domain::id::JobId;

/// Crash-consistent key/value store.
///
/// A `put` that returns `Ok` must be visible after an unclean exit that
/// immediately follows it. Only single-key atomicity is required.
pub trait JobStore {
    /// Insert or overwrite the value stored under `key`.
    fn put(&self, key: &str, value: String) -> impl Future<Output = Result<(), SoakError>> + Send;

    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, SoakError>> + Send;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), SoakError>> + Send;

    /// Every key currently stored, in no particular order.
    fn iterate_keys(&self) -> impl Future<Output = Result<Vec<String>, SoakError>> + Send;
}

impl<T: JobStore + Send + Sync> JobStore for std::sync::Arc<T> {
    fn put(&self, key: &str, value: String) -> impl Future<Output = Result<(), SoakError>> + Send {
        (**self).put(key, value)
    }

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, SoakError>> + Send {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), SoakError>> + Send {
        (**self).delete(key)
    }

    fn iterate_keys(&self) -> impl Future<Output = Result<Vec<String>, SoakError>> + Send {
        (**self).iterate_keys()
    }
}

/// Key namespaces inside a shared [`JobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    /// Prefix of every job record key (`job:<job_id>`).
    pub jobs_prefix: String,
    /// Single key holding the persisted daily summary.
    pub summary_key: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            jobs_prefix: "job:".to_string(),
            summary_key: "daily:summary".to_string(),
        }
    }
}

impl StoreKeys {
    #[must_use]
    pub fn job_key(&self, job_id: &JobId) -> String {
        format!("{}{job_id}", self.jobs_prefix)
    }

    /// Extract the job id from a key of the jobs namespace.
    #[must_use]
    pub fn job_id(&self, key: &str) -> Option<JobId> {
        key.strip_prefix(&self.jobs_prefix)
            .and_then(|raw| raw.parse().ok())
    }
}
