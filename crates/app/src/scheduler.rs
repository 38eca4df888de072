//! Durable scheduler — one-shot timers backed by the [`JobStore`].
//!
//! Every job is written to the store before its timer is armed, so a restart
//! can re-arm it from [`Scheduler::restore`]. Timers are tokio tasks that only
//! *notify* the event loop through a channel; the loop runs the handler
//! itself through [`fire`], one job at a time.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use heatsoak_domain::error::SoakError;
use heatsoak_domain::id::JobId;
use heatsoak_domain::job::{HandlerId, JobPayload, JobRecord};
use heatsoak_domain::time::{Timestamp, delay_until, now};

use crate::ports::{JobStore, StoreKeys};

/// Notification sent by an armed timer when its delay has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer {
    pub job_id: JobId,
    generation: u64,
}

#[derive(Debug)]
struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// A job re-armed by [`Scheduler::restore`].
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredJob {
    pub job_id: JobId,
    pub record: JobRecord,
}

/// What [`Scheduler::restore`] found in the store.
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub restored: Vec<RestoredJob>,
    /// Past due at start-up; deleted without firing.
    pub expired: Vec<JobId>,
    /// Undecodable; left in the store and not armed.
    pub corrupt: Vec<JobId>,
}

/// Outcome of [`fire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Ran,
    /// No record under that id (already fired or cancelled).
    Missing,
    /// The record names a handler nobody registered.
    Dropped,
}

pub struct Scheduler<S> {
    store: S,
    keys: StoreKeys,
    timers: HashMap<JobId, ArmedTimer>,
    next_generation: u64,
    fired_tx: mpsc::UnboundedSender<FiredTimer>,
}

impl<S: JobStore> Scheduler<S> {
    /// Create a scheduler and the receiving end of its timer notifications.
    pub fn new(store: S, keys: StoreKeys) -> (Self, mpsc::UnboundedReceiver<FiredTimer>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            store,
            keys,
            timers: HashMap::new(),
            next_generation: 0,
            fired_tx,
        };
        (scheduler, fired_rx)
    }

    /// Persist a job, then arm its timer.
    ///
    /// A `run_at` in the past fires on the next turn of the loop. Passing the
    /// id of an existing job overwrites its record and replaces its timer.
    ///
    /// # Errors
    ///
    /// Returns an encoding or storage error; in that case no timer is armed.
    pub async fn schedule(
        &mut self,
        handler: impl Into<HandlerId>,
        run_at: Timestamp,
        payload: JobPayload,
        job_id: Option<JobId>,
    ) -> Result<JobId, SoakError> {
        let job_id = job_id.unwrap_or_default();
        let record = JobRecord {
            handler: handler.into(),
            run_at,
            payload,
        };
        self.store
            .put(&self.keys.job_key(&job_id), record.encode()?)
            .await?;
        let delay = self.arm(job_id.clone(), run_at);
        tracing::info!(
            job_id = %job_id,
            handler = %record.handler,
            %run_at,
            delay_secs = delay.as_secs(),
            "scheduled job"
        );
        Ok(job_id)
    }

    /// Re-arm every pending job found in the store. Call once at start-up,
    /// before scheduling anything new.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read or an expired
    /// record cannot be deleted.
    pub async fn restore(&mut self) -> Result<RestoreReport, SoakError> {
        let mut report = RestoreReport::default();
        let now = now();

        for key in self.store.iterate_keys().await? {
            let Some(job_id) = self.keys.job_id(&key) else {
                continue;
            };
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };
            let record = match JobRecord::decode(&key, &raw) {
                Ok(record) => record,
                Err(err) => {
                    tracing::error!(job_id = %job_id, error = %err, "ignoring undecodable job record");
                    report.corrupt.push(job_id);
                    continue;
                }
            };

            if record.run_at <= now {
                self.store.delete(&key).await?;
                tracing::info!(
                    job_id = %job_id,
                    handler = %record.handler,
                    run_at = %record.run_at,
                    "skipped expired job"
                );
                report.expired.push(job_id);
                continue;
            }

            let delay = self.arm(job_id.clone(), record.run_at);
            tracing::info!(
                job_id = %job_id,
                handler = %record.handler,
                delay_secs = delay.as_secs(),
                "restored job"
            );
            report.restored.push(RestoredJob { job_id, record });
        }

        Ok(report)
    }

    /// Stop the timer if it is live and delete the record. Safe to call on a
    /// job that already fired or never existed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the record cannot be deleted.
    pub async fn cancel(&mut self, job_id: &JobId) -> Result<(), SoakError> {
        let was_armed = self.disarm(job_id);
        self.store.delete(&self.keys.job_key(job_id)).await?;
        tracing::info!(job_id = %job_id, was_armed, "cancelled job");
        Ok(())
    }

    /// Claim a timer notification. Returns `false` for a notification from a
    /// timer that has since been replaced or cancelled.
    pub fn accept(&mut self, fired: &FiredTimer) -> bool {
        match self.timers.get(&fired.job_id) {
            Some(timer) if timer.generation == fired.generation => {
                self.timers.remove(&fired.job_id);
                true
            }
            _ => {
                tracing::debug!(job_id = %fired.job_id, "ignoring stale timer");
                false
            }
        }
    }

    #[must_use]
    pub fn is_armed(&self, job_id: &JobId) -> bool {
        self.timers.contains_key(job_id)
    }

    /// Read a job record.
    ///
    /// # Errors
    ///
    /// Returns a storage error, or [`SoakError::Corrupt`] when the record
    /// cannot be decoded.
    pub async fn load(&self, job_id: &JobId) -> Result<Option<JobRecord>, SoakError> {
        let key = self.keys.job_key(job_id);
        match self.store.get(&key).await? {
            Some(raw) => Ok(Some(JobRecord::decode(&key, &raw)?)),
            None => Ok(None),
        }
    }

    /// Delete the record of a job that just ran, unless its handler
    /// scheduled it again under the same id.
    async fn finish(&mut self, job_id: &JobId) -> Result<(), SoakError> {
        if self.is_armed(job_id) {
            return Ok(());
        }
        self.store.delete(&self.keys.job_key(job_id)).await
    }

    fn disarm(&mut self, job_id: &JobId) -> bool {
        self.timers
            .remove(job_id)
            .map(|timer| timer.handle.abort())
            .is_some()
    }

    fn arm(&mut self, job_id: JobId, run_at: Timestamp) -> Duration {
        let delay = delay_until(run_at, now());
        self.next_generation += 1;
        let generation = self.next_generation;
        let fired = FiredTimer {
            job_id: job_id.clone(),
            generation,
        };
        let tx = self.fired_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // the receiver is gone only when the loop is shutting down.
            let _ = tx.send(fired);
        });
        if let Some(previous) = self.timers.insert(job_id, ArmedTimer { generation, handle }) {
            previous.handle.abort();
        }
        delay
    }
}

impl<S> Drop for Scheduler<S> {
    fn drop(&mut self) {
        for timer in self.timers.values() {
            timer.handle.abort();
        }
    }
}

/// Maps stable handler names to the handlers a runner knows how to run.
#[derive(Debug, Clone)]
pub struct HandlerRegistry<H> {
    handlers: HashMap<HandlerId, H>,
}

impl<H> Default for HandlerRegistry<H> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<H: Copy> HandlerRegistry<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `id`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, id: impl Into<HandlerId>, handler: H) -> Self {
        self.handlers.insert(id.into(), handler);
        self
    }

    #[must_use]
    pub fn resolve(&self, id: &HandlerId) -> Option<H> {
        self.handlers.get(id).copied()
    }
}

/// Owner of a [`Scheduler`] that can run the handlers it registered.
pub trait JobRunner {
    type Store: JobStore;
    type Handler: Copy;

    fn scheduler(&mut self) -> &mut Scheduler<Self::Store>;

    fn registry(&self) -> &HandlerRegistry<Self::Handler>;

    fn run(
        &mut self,
        handler: Self::Handler,
        payload: JobPayload,
    ) -> impl Future<Output = Result<(), SoakError>>;
}

/// Run the job `job_id` on `runner`, then delete its record.
///
/// The record is deleted even when the handler fails; a failed job is not
/// retried.
///
/// # Errors
///
/// Returns the handler's error, or a storage error from the job store.
pub async fn fire<R: JobRunner>(runner: &mut R, job_id: &JobId) -> Result<FireOutcome, SoakError> {
    let scheduler = runner.scheduler();
    scheduler.disarm(job_id);
    let Some(record) = scheduler.load(job_id).await? else {
        tracing::warn!(job_id = %job_id, "fired job has no record, ignoring");
        return Ok(FireOutcome::Missing);
    };

    let Some(handler) = runner.registry().resolve(&record.handler) else {
        tracing::error!(job_id = %job_id, handler = %record.handler, "no handler registered, dropping job");
        runner.scheduler().finish(job_id).await?;
        return Ok(FireOutcome::Dropped);
    };

    tracing::info!(job_id = %job_id, handler = %record.handler, "running job");
    let result = runner.run(handler, record.payload).await;
    runner.scheduler().finish(job_id).await?;
    result.map(|()| FireOutcome::Ran)
}
