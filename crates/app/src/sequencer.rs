//! Zone sequencer — walks the day's queue of zones one at a time.
//!
//! Each zone is overridden, then released by a `complete_zone` job armed
//! through the [`Scheduler`], then sampled a few more times while external
//! HVAC activity on it is recorded as unplanned. Only one zone is ever
//! heating. Everything needed to resume after a restart lives in the job
//! store: the pending jobs and the [`DailySummary`].
//!
//! ```text
//! plan_day ─▶ begin_run ─▶ begin_zone ─▶ complete_zone ─▶ begin_zone ─▶ … ─▶ finalize_day
//!                                             └─▶ sample_temperature ×N
//! ```

pub mod config;
pub mod jobs;

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tokio::sync::mpsc;

use heatsoak_domain::error::{NotFoundError, SoakError, StateError};
use heatsoak_domain::hvac::{HvacAction, HvacActivity, Transition};
use heatsoak_domain::id::{JobId, ZoneId};
use heatsoak_domain::job::{JobPayload, from_payload, to_payload};
use heatsoak_domain::phase::{RunState, ZonePhase};
use heatsoak_domain::summary::{DailySummary, UnplannedClose, ZoneSummary};
use heatsoak_domain::time::{self, Timestamp, now};

use crate::ports::{Actuator, ForecastSource, JobStore, ModeFlags, ReportSink, StoreKeys};
use crate::scheduler::{self, FireOutcome, FiredTimer, HandlerRegistry, JobRunner, Scheduler};
use crate::summary_store::SummaryStore;

pub use config::{SequencerConfig, ZeroDurationPolicy, ZonePlan, next_local_time};
pub use jobs::{
    BEGIN_RUN_JOB, CompletionPayload, FINALIZE_DAY_JOB, PLAN_DAY_JOB, SoakJob, ZonePayload,
};

/// The devices and flags the sequencer drives and consults.
pub struct Collaborators<A, F, R, M> {
    pub actuator: A,
    pub forecast: F,
    pub sink: R,
    pub modes: M,
}

/// What [`ZoneSequencer::recover`] found and fixed.
#[derive(Debug, Default)]
pub struct Recovery {
    pub restored_jobs: usize,
    pub expired_jobs: usize,
    /// Started zones that got a fresh completion job.
    pub repaired: Vec<ZoneId>,
    /// Zones not reached before the restart, still queued.
    pub queued: Vec<ZoneId>,
}

pub struct ZoneSequencer<S, A, F, R, M> {
    config: SequencerConfig,
    scheduler: Scheduler<S>,
    summaries: SummaryStore<S>,
    actuator: A,
    forecast: F,
    sink: R,
    modes: M,
    registry: HandlerRegistry<SoakJob>,
    summary: DailySummary,
    queue: VecDeque<ZoneId>,
    phases: HashMap<ZoneId, ZonePhase>,
    listening: BTreeSet<ZoneId>,
    monitoring_jobs: HashMap<ZoneId, Vec<JobId>>,
    state: RunState,
}

impl<S, A, F, R, M> ZoneSequencer<S, A, F, R, M>
where
    S: JobStore + Clone,
    A: Actuator,
    F: ForecastSource,
    R: ReportSink,
    M: ModeFlags,
{
    /// Build a sequencer over `store`, returning it with the receiver of its
    /// timer notifications. Nothing is loaded until [`recover`](Self::recover).
    pub fn new(
        config: SequencerConfig,
        store: S,
        keys: StoreKeys,
        collaborators: Collaborators<A, F, R, M>,
    ) -> (Self, mpsc::UnboundedReceiver<FiredTimer>) {
        let summaries = SummaryStore::new(store.clone(), keys.summary_key.clone());
        let (scheduler, timers) = Scheduler::new(store, keys);
        let sequencer = Self {
            config,
            scheduler,
            summaries,
            actuator: collaborators.actuator,
            forecast: collaborators.forecast,
            sink: collaborators.sink,
            modes: collaborators.modes,
            registry: SoakJob::registry(),
            summary: DailySummary::default(),
            queue: VecDeque::new(),
            phases: HashMap::new(),
            listening: BTreeSet::new(),
            monitoring_jobs: HashMap::new(),
            state: RunState::Idle,
        };
        (sequencer, timers)
    }

    // ── Accessors ──────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> &RunState {
        &self.state
    }

    #[must_use]
    pub fn summary(&self) -> &DailySummary {
        &self.summary
    }

    /// Zones still waiting for their turn, head first.
    pub fn queue(&self) -> impl Iterator<Item = &ZoneId> {
        self.queue.iter()
    }

    #[must_use]
    pub fn phase(&self, zone: &ZoneId) -> Option<ZonePhase> {
        self.phases.get(zone).copied()
    }

    #[must_use]
    pub fn is_listening(&self, zone: &ZoneId) -> bool {
        self.listening.contains(zone)
    }

    /// Whether the next `plan_day` job is armed.
    #[must_use]
    pub fn is_planned(&self) -> bool {
        self.scheduler.is_armed(&jobs::fixed(PLAN_DAY_JOB))
    }

    // ── Start-up ───────────────────────────────────────────────────

    /// Check that every configured zone exists.
    ///
    /// # Errors
    ///
    /// Returns [`SoakError::NotFound`] for the first unknown zone, or the
    /// actuator's error.
    pub async fn verify_zones(&self) -> Result<(), SoakError> {
        for plan in &self.config.zones {
            if !self.actuator.has_zone(&plan.zone).await? {
                tracing::error!(zone = %plan.zone, "configured zone does not exist");
                return Err(NotFoundError::zone(&plan.zone).into());
            }
        }
        Ok(())
    }

    /// Reload the persisted summary, re-arm pending jobs and rebuild the
    /// queue position. Call once at start-up.
    ///
    /// # Errors
    ///
    /// Returns a storage error, or any error raised while resuming the queue.
    pub async fn recover(&mut self) -> Result<Recovery, SoakError> {
        self.summary = self.summaries.load_or_default().await?;
        let restore = self.scheduler.restore().await?;

        let mut recovery = Recovery {
            restored_jobs: restore.restored.len(),
            expired_jobs: restore.expired.len(),
            ..Recovery::default()
        };

        let mut completion_pending = HashSet::new();
        for job in restore.restored {
            let handler = job.record.handler;
            let decoded = match self.registry.resolve(&handler) {
                Some(SoakJob::CompleteZone) => {
                    from_payload::<CompletionPayload>(handler.as_str(), job.record.payload)
                        .map(|payload| {
                            completion_pending.insert(payload.zone);
                        })
                }
                Some(SoakJob::SampleTemperature) => {
                    from_payload::<ZonePayload>(handler.as_str(), job.record.payload).map(
                        |payload| {
                            self.monitoring_jobs
                                .entry(payload.zone)
                                .or_default()
                                .push(job.job_id.clone());
                        },
                    )
                }
                _ => Ok(()),
            };
            if let Err(err) = decoded {
                tracing::error!(job_id = %job.job_id, error = %err, "restored job has unreadable arguments");
            }
        }

        if !self.summary.is_open() {
            tracing::info!(restored = recovery.restored_jobs, "no day in progress");
            return Ok(recovery);
        }

        let mut current = None;
        let records: Vec<ZoneSummary> = self.summary.zones.iter().cloned().collect();
        for record in records {
            let zone = record.zone.clone();
            if record.completed {
                let phase = if self.monitoring_jobs.contains_key(&zone) {
                    ZonePhase::Monitoring
                } else {
                    ZonePhase::Done
                };
                self.phases.insert(zone.clone(), phase);
                self.listening.insert(zone);
                continue;
            }

            if !completion_pending.contains(&zone) {
                let run_at = record.end_time.max(now());
                self.schedule_completion(&zone, record.override_applied, run_at)
                    .await?;
                tracing::warn!(zone = %zone, %run_at, "completion job was lost, rescheduled");
                recovery.repaired.push(zone.clone());
            }
            self.phases.insert(zone.clone(), ZonePhase::Heating);
            current = Some(zone);
        }

        for plan in &self.config.zones {
            if self.summary.zones.contains(&plan.zone) {
                continue;
            }
            if self.zone_needs_treatment(&plan.zone).await {
                self.queue.push_back(plan.zone.clone());
                self.phases.insert(plan.zone.clone(), ZonePhase::Pending);
            }
        }
        recovery.queued = self.queue.iter().cloned().collect();

        tracing::info!(
            restored = recovery.restored_jobs,
            expired = recovery.expired_jobs,
            repaired = recovery.repaired.len(),
            queued = recovery.queued.len(),
            current = ?current,
            "resuming day in progress"
        );

        if current.is_some() {
            self.state = RunState::Running { current };
        } else if !self.queue.is_empty() {
            self.state = RunState::Running { current: None };
            self.advance().await?;
        } else {
            self.state = RunState::AllProcessed;
        }
        Ok(recovery)
    }

    // ── Planning ───────────────────────────────────────────────────

    /// Plan today's run and tomorrow's planning.
    ///
    /// Returns the time `begin_run` is scheduled at, or `None` when away mode
    /// is off and no run was planned.
    ///
    /// # Errors
    ///
    /// Returns a storage error, or the error of finalizing a stale day.
    #[tracing::instrument(skip(self))]
    pub async fn plan_day(&mut self) -> Result<Option<Timestamp>, SoakError> {
        if self.summary.is_open() {
            if self.state.current().is_some() || !self.queue.is_empty() {
                tracing::warn!("previous run still in progress, leaving it to its finalize job");
            } else {
                tracing::info!("finalizing day left open by a previous run");
                self.finalize_day().await?;
            }
        }

        let started = now();
        let next_plan = next_local_time(started, self.config.plan_at);
        self.scheduler
            .schedule(
                SoakJob::PlanDay.name(),
                next_plan,
                JobPayload::new(),
                Some(jobs::fixed(PLAN_DAY_JOB)),
            )
            .await?;

        if !self.modes.away_mode_enabled() {
            self.scheduler.cancel(&jobs::fixed(BEGIN_RUN_JOB)).await?;
            tracing::info!("away mode is off, not running today");
            return Ok(None);
        }

        let quick_run = self.modes.quick_run();
        let total = self.config.total_duration(quick_run);
        let run_at = self.best_run_at(started, total).await;

        self.scheduler
            .schedule(
                SoakJob::BeginRun.name(),
                run_at,
                JobPayload::new(),
                Some(jobs::fixed(BEGIN_RUN_JOB)),
            )
            .await?;

        let last_sample = self
            .config
            .sample_delays(quick_run)
            .iter()
            .max()
            .copied()
            .unwrap_or_default();
        let finalize_at = time::add(run_at, total + last_sample + self.config.finalize_grace);
        self.scheduler
            .schedule(
                SoakJob::FinalizeDay.name(),
                finalize_at,
                JobPayload::new(),
                Some(jobs::fixed(FINALIZE_DAY_JOB)),
            )
            .await?;

        tracing::info!(%run_at, %finalize_at, "planned today's run");
        Ok(Some(run_at))
    }

    async fn best_run_at(&self, now: Timestamp, total: std::time::Duration) -> Timestamp {
        let fallback = next_local_time(now, self.config.default_run_at);
        match self.forecast.best_window(total.as_secs() / 60).await {
            Ok(Some(window)) if window > now => window,
            Ok(Some(window)) => next_local_time(now, window.with_timezone(&chrono::Local).time()),
            Ok(None) => fallback,
            Err(err) => {
                tracing::warn!(error = %err, "forecast unavailable, using default run time");
                fallback
            }
        }
    }

    // ── Run ────────────────────────────────────────────────────────

    /// Open a new day and start the first zone that needs treatment.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DayInProgress`] while the previous day has not
    /// been finalized, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn begin_run(&mut self) -> Result<(), SoakError> {
        if self.modes.disabled() {
            tracing::info!("disabled, not starting a run");
            return Ok(());
        }
        if self.summary.is_open() {
            return Err(StateError::DayInProgress.into());
        }

        let mut queue = VecDeque::new();
        for plan in &self.config.zones {
            if self.zone_needs_treatment(&plan.zone).await {
                queue.push_back(plan.zone.clone());
            }
        }

        self.summary.set_start_time(now());
        match self.forecast.daily_summary().await {
            Ok(snapshot) => self.summary.set_forecast(snapshot),
            Err(err) => tracing::warn!(error = %err, "forecast snapshot unavailable"),
        }
        self.summaries.save(&self.summary).await?;

        self.phases = queue
            .iter()
            .map(|zone| (zone.clone(), ZonePhase::Pending))
            .collect();
        self.queue = queue;

        if self.queue.is_empty() {
            tracing::info!("no zone needs treatment, nothing to do");
            self.state = RunState::AllProcessed;
            return Ok(());
        }

        tracing::info!(zones = self.queue.len(), "starting run");
        self.state = RunState::Running { current: None };
        self.advance().await
    }

    async fn advance(&mut self) -> Result<(), SoakError> {
        match self.queue.pop_front() {
            Some(zone) => self.begin_zone(zone).await,
            None => {
                tracing::info!("all zones processed");
                self.state = RunState::AllProcessed;
                Ok(())
            }
        }
    }

    /// Override one zone and arm its completion job.
    ///
    /// The summary record and the completion job are persisted before the
    /// override command is sent.
    ///
    /// # Errors
    ///
    /// Returns a storage error, or the actuator's error for the override.
    #[tracing::instrument(skip(self, zone), fields(zone = %zone))]
    pub async fn begin_zone(&mut self, zone: ZoneId) -> Result<(), SoakError> {
        let dry_run = self.modes.dry_run();
        let duration = self.config.run_duration(&zone, self.modes.quick_run());
        let override_applied = !dry_run && !duration.is_zero();

        let start_temp = self.sample(&zone).await;
        let outside_temp = match self.actuator.outside_temperature().await {
            Ok(temperature) => temperature,
            Err(err) => {
                tracing::warn!(error = %err, "outside temperature unavailable");
                None
            }
        };

        let start = now();
        let end = time::add(start, duration);
        let record = ZoneSummary::builder()
            .zone(zone.clone())
            .hvac_action(HvacAction::Heating)
            .start_time(start)
            .end_time(end)
            .target_temp(self.config.heat_to_temp)
            .start_temp(start_temp)
            .outside_temp(outside_temp)
            .override_applied(override_applied)
            .build()?;
        self.summary.start_zone(record);
        self.summaries.save(&self.summary).await?;
        self.schedule_completion(&zone, override_applied, end).await?;

        self.phases.insert(zone.clone(), ZonePhase::Heating);
        self.state = RunState::Running {
            current: Some(zone.clone()),
        };

        if override_applied {
            self.actuator
                .apply_override(&zone, self.config.heat_to_temp)
                .await?;
            tracing::info!(
                target_temp = self.config.heat_to_temp,
                duration_secs = duration.as_secs(),
                "override applied"
            );
            self.settle(&zone, HvacAction::Heating).await;
        } else if duration.is_zero() {
            tracing::info!("zero-length run, override not applied");
        } else {
            tracing::info!(
                dry_run = true,
                target_temp = self.config.heat_to_temp,
                duration_secs = duration.as_secs(),
                "override skipped"
            );
        }
        Ok(())
    }

    async fn schedule_completion(
        &mut self,
        zone: &ZoneId,
        override_applied: bool,
        run_at: Timestamp,
    ) -> Result<JobId, SoakError> {
        let payload = to_payload(&CompletionPayload {
            zone: zone.clone(),
            override_applied,
        })?;
        self.scheduler
            .schedule(SoakJob::CompleteZone.name(), run_at, payload, None)
            .await
    }

    /// Release a zone, record its end temperature, arm its follow-up
    /// samples and move on to the next zone.
    ///
    /// # Errors
    ///
    /// Returns [`SoakError::NotFound`] when the zone was never started, or a
    /// storage or actuator error.
    #[tracing::instrument(skip(self, payload), fields(zone = %payload.zone))]
    pub async fn complete_zone(&mut self, payload: CompletionPayload) -> Result<(), SoakError> {
        let zone = payload.zone;
        let record = self
            .summary
            .zone(&zone)
            .ok_or_else(|| NotFoundError::zone(&zone))?;
        if record.completed {
            tracing::warn!("zone already completed, ignoring");
            return Ok(());
        }

        let dry_run = self.modes.dry_run();
        let zero_length = record.duration <= 0.0;
        let release = payload.override_applied
            || (zero_length
                && !dry_run
                && self.config.zero_duration_policy == ZeroDurationPolicy::AlwaysRestore);

        if release {
            self.actuator
                .release(&zone, self.config.restore_temp)
                .await?;
            self.phases.insert(zone.clone(), ZonePhase::Released);
            tracing::info!(restore_temp = self.config.restore_temp, "zone released");
            self.settle(&zone, HvacAction::Idle).await;
        } else {
            self.phases.insert(zone.clone(), ZonePhase::Released);
            tracing::info!(dry_run, zero_length, "restore skipped");
        }

        let end_temp = self.sample(&zone).await;
        let completed = self.summary.complete_zone(&zone, end_temp)?;
        tracing::info!(
            start_temp = ?completed.start_temp,
            end_temp = ?completed.end_temp,
            outside_temp = ?completed.outside_temp,
            "zone completed"
        );
        self.summaries.save(&self.summary).await?;

        let released_at = now();
        let delays = self.config.sample_delays(self.modes.quick_run()).to_vec();
        let mut sample_jobs = Vec::with_capacity(delays.len());
        for delay in delays {
            let payload = to_payload(&ZonePayload { zone: zone.clone() })?;
            let job_id = self
                .scheduler
                .schedule(
                    SoakJob::SampleTemperature.name(),
                    time::add(released_at, delay),
                    payload,
                    None,
                )
                .await?;
            sample_jobs.push(job_id);
        }
        if sample_jobs.is_empty() {
            self.phases.insert(zone.clone(), ZonePhase::Done);
        } else {
            self.phases.insert(zone.clone(), ZonePhase::Monitoring);
            self.monitoring_jobs.insert(zone.clone(), sample_jobs);
        }
        self.listening.insert(zone.clone());

        if self.state.current() == Some(&zone) {
            self.state = RunState::Running { current: None };
        }
        self.advance().await
    }

    /// Record one post-release temperature sample.
    ///
    /// # Errors
    ///
    /// Returns [`SoakError::NotFound`] when the zone is not in today's
    /// summary, or a storage error.
    #[tracing::instrument(skip(self, payload), fields(zone = %payload.zone))]
    pub async fn sample_temperature(&mut self, payload: ZonePayload) -> Result<(), SoakError> {
        let zone = payload.zone;
        if self.summary.zone(&zone).is_none() {
            return Err(NotFoundError::zone(&zone).into());
        }

        if let Some(temperature) = self.sample(&zone).await {
            let record = self
                .summary
                .add_delay_temperature(&zone, temperature, now())?;
            self.summaries.save(&self.summary).await?;
            tracing::info!(
                temperature,
                seconds_after_end = record.seconds_after_end,
                "temperature sampled"
            );
        }

        let finished = match self.monitoring_jobs.get_mut(&zone) {
            Some(pending) => {
                pending.retain(|job_id| self.scheduler.is_armed(job_id));
                pending.is_empty()
            }
            None => true,
        };
        if finished {
            self.monitoring_jobs.remove(&zone);
            self.phases.insert(zone, ZonePhase::Done);
        }
        Ok(())
    }

    /// Record HVAC activity observed on a released zone. Never sends a
    /// command.
    ///
    /// # Errors
    ///
    /// Returns [`SoakError::NotFound`] when a listened zone is missing from
    /// the summary, or a storage error.
    pub async fn on_unplanned_activity(&mut self, activity: HvacActivity) -> Result<(), SoakError> {
        let zone = &activity.zone;
        if !self.listening.contains(zone) {
            tracing::trace!(zone = %zone, "activity on a zone that is not listened, ignoring");
            return Ok(());
        }

        match activity.transition() {
            Transition::Started(action) => {
                self.summary
                    .start_unplanned_hvac_action(zone, action, activity.at)?;
                self.summaries.save(&self.summary).await?;
                tracing::info!(zone = %zone, hvac_action = %action, "unplanned hvac action started");
            }
            Transition::Stopped => {
                match self.summary.complete_unplanned_hvac_action(zone, activity.at)? {
                    UnplannedClose::Closed { duration } => {
                        self.summaries.save(&self.summary).await?;
                        tracing::info!(zone = %zone, duration, "unplanned hvac action stopped");
                    }
                    UnplannedClose::AlreadyCompleted => {
                        tracing::warn!(zone = %zone, "last unplanned hvac action already completed");
                    }
                    UnplannedClose::NothingOpen => {
                        tracing::warn!(zone = %zone, "no unplanned hvac action to complete");
                    }
                }
            }
            Transition::Other => {
                tracing::debug!(zone = %zone, from = %activity.from, to = %activity.to, "ignoring hvac change");
            }
        }
        Ok(())
    }

    /// Export the day and reset for the next one. Returns the number of
    /// exported rows; an empty day exports nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::ZoneHeating`] while a zone is still heating, or
    /// a storage or export error. When the export fails the day is left
    /// untouched: pending samples and listeners are kept.
    #[tracing::instrument(skip(self))]
    pub async fn finalize_day(&mut self) -> Result<usize, SoakError> {
        if let Some(zone) = self.state.current() {
            return Err(StateError::ZoneHeating(zone.to_string()).into());
        }

        let mut closing = self.summary.clone();
        let zones: Vec<ZoneId> = closing.started_zones().cloned().collect();
        for zone in &zones {
            if let Some(temperature) = self.sample(zone).await {
                closing.add_delay_temperature(zone, temperature, now())?;
            }
        }

        let rows = closing.reports();
        if !rows.is_empty() {
            self.sink.append(&rows).await?;
        }
        tracing::debug!(summary = %closing, "final daily summary");

        self.listening.clear();
        let pending: Vec<JobId> = self
            .monitoring_jobs
            .drain()
            .flat_map(|(_, jobs)| jobs)
            .collect();
        for job_id in &pending {
            self.scheduler.cancel(job_id).await?;
        }

        self.summaries.clear().await?;
        self.summary = DailySummary::default();
        self.queue.clear();
        self.phases.clear();
        self.state = RunState::Idle;

        tracing::info!(rows = rows.len(), "day finalized");
        Ok(rows.len())
    }

    // ── Timers ─────────────────────────────────────────────────────

    /// Handle a timer notification from the scheduler channel.
    ///
    /// # Errors
    ///
    /// Returns the error of the job's handler.
    pub async fn on_timer(&mut self, fired: FiredTimer) -> Result<Option<FireOutcome>, SoakError> {
        if !self.scheduler.accept(&fired) {
            return Ok(None);
        }
        self.run_job(&fired.job_id).await.map(Some)
    }

    /// Run a pending job now, whether or not its timer elapsed.
    ///
    /// # Errors
    ///
    /// Returns the error of the job's handler.
    pub async fn run_job(&mut self, job_id: &JobId) -> Result<FireOutcome, SoakError> {
        scheduler::fire(self, job_id).await
    }

    // ── Helpers ────────────────────────────────────────────────────

    async fn zone_needs_treatment(&self, zone: &ZoneId) -> bool {
        match self.actuator.needs_treatment(zone).await {
            Ok(needed) => needed,
            Err(err) => {
                tracing::warn!(zone = %zone, error = %err, "cannot read zone mode, skipping");
                false
            }
        }
    }

    async fn sample(&self, zone: &ZoneId) -> Option<f64> {
        match self.actuator.current_temperature(zone).await {
            Ok(temperature) => Some(temperature),
            Err(err) => {
                tracing::warn!(zone = %zone, error = %err, "temperature unavailable");
                None
            }
        }
    }

    async fn settle(&self, zone: &ZoneId, expected: HvacAction) {
        match self
            .actuator
            .wait_for_attribute(zone, "hvac_action", expected.as_str(), self.config.settle_timeout)
            .await
        {
            Ok(true) => tracing::debug!(zone = %zone, hvac_action = %expected, "device settled"),
            Ok(false) => tracing::warn!(
                zone = %zone,
                hvac_action = %expected,
                timeout_secs = self.config.settle_timeout.as_secs(),
                "device did not settle in time, continuing"
            ),
            Err(err) => tracing::warn!(zone = %zone, error = %err, "cannot watch device, continuing"),
        }
    }
}

impl<S, A, F, R, M> JobRunner for ZoneSequencer<S, A, F, R, M>
where
    S: JobStore + Clone,
    A: Actuator,
    F: ForecastSource,
    R: ReportSink,
    M: ModeFlags,
{
    type Store = S;
    type Handler = SoakJob;

    fn scheduler(&mut self) -> &mut Scheduler<S> {
        &mut self.scheduler
    }

    fn registry(&self) -> &HandlerRegistry<SoakJob> {
        &self.registry
    }

    async fn run(&mut self, handler: SoakJob, payload: JobPayload) -> Result<(), SoakError> {
        match handler {
            SoakJob::BeginRun => self.begin_run().await,
            SoakJob::CompleteZone => {
                let payload = from_payload(handler.name(), payload)?;
                self.complete_zone(payload).await
            }
            SoakJob::SampleTemperature => {
                let payload = from_payload(handler.name(), payload)?;
                self.sample_temperature(payload).await
            }
            SoakJob::FinalizeDay => self.finalize_day().await.map(|_| ()),
            SoakJob::PlanDay => self.plan_day().await.map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use heatsoak_domain::forecast::ForecastSnapshot;
    use heatsoak_domain::job::JobRecord;

    use super::*;
    use crate::ports::SharedModes;
    use crate::testing::{Command, FakeActuator, FakeForecast, InMemoryJobStore, MemorySink};

    type TestSequencer =
        ZoneSequencer<Arc<InMemoryJobStore>, FakeActuator, FakeForecast, MemorySink, SharedModes>;

    const A: &str = "climate.main_floor";
    const B: &str = "climate.ski_room";
    const C: &str = "climate.basement";

    struct Harness {
        store: Arc<InMemoryJobStore>,
        actuator: FakeActuator,
        forecast: FakeForecast,
        sink: MemorySink,
        modes: SharedModes,
        config: SequencerConfig,
    }

    impl Harness {
        fn new(zones: &[(&'static str, bool, f64)]) -> Self {
            Self {
                store: Arc::new(InMemoryJobStore::default()),
                actuator: FakeActuator::with_zones(zones),
                forecast: FakeForecast::default(),
                sink: MemorySink::default(),
                modes: SharedModes::new(false, false, false, true),
                config: SequencerConfig {
                    zones: zones
                        .iter()
                        .map(|(zone, _, _)| ZonePlan::new(ZoneId::from(*zone)))
                        .collect(),
                    ..SequencerConfig::default()
                },
            }
        }

        fn sequencer(&self) -> TestSequencer {
            let (sequencer, _timers) = ZoneSequencer::new(
                self.config.clone(),
                Arc::clone(&self.store),
                StoreKeys::default(),
                Collaborators {
                    actuator: self.actuator.clone(),
                    forecast: self.forecast.clone(),
                    sink: self.sink.clone(),
                    modes: self.modes.clone(),
                },
            );
            sequencer
        }

        fn jobs(&self, handler: SoakJob) -> Vec<(JobId, JobRecord)> {
            let mut jobs: Vec<(JobId, JobRecord)> = self
                .store
                .keys()
                .into_iter()
                .filter_map(|key| {
                    let id = StoreKeys::default().job_id(&key)?;
                    let raw = self.store.raw(&key)?;
                    let record = JobRecord::decode(&key, &raw).ok()?;
                    (record.handler.as_str() == handler.name()).then_some((id, record))
                })
                .collect();
            jobs.sort_by_key(|(_, record)| record.run_at);
            jobs
        }

        fn only_job(&self, handler: SoakJob) -> JobId {
            let jobs = self.jobs(handler);
            assert_eq!(jobs.len(), 1, "expected one {} job", handler.name());
            jobs[0].0.clone()
        }
    }

    fn zone(id: &'static str) -> ZoneId {
        ZoneId::from(id)
    }

    fn overrides(commands: &[Command]) -> Vec<ZoneId> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::Override(zone, _) => Some(zone.clone()),
                Command::Release(..) => None,
            })
            .collect()
    }

    fn releases(commands: &[Command]) -> Vec<ZoneId> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::Release(zone, _) => Some(zone.clone()),
                Command::Override(..) => None,
            })
            .collect()
    }

    fn activity(id: &'static str, from: HvacAction, to: HvacAction, at: Timestamp) -> HvacActivity {
        HvacActivity {
            zone: zone(id),
            from,
            to,
            at,
        }
    }

    async fn complete_current(harness: &Harness, sequencer: &mut TestSequencer) {
        let job = harness.only_job(SoakJob::CompleteZone);
        assert_eq!(sequencer.run_job(&job).await.unwrap(), FireOutcome::Ran);
    }

    // ── begin / complete ───────────────────────────────────────────

    #[tokio::test]
    async fn should_apply_override_and_schedule_completion_when_zone_begins() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();

        sequencer.begin_run().await.unwrap();

        assert_eq!(
            harness.actuator.commands(),
            vec![Command::Override(zone(A), 19.5)]
        );
        let record = sequencer.summary().zone(&zone(A)).unwrap().clone();
        assert!((record.duration - 1200.0).abs() < f64::EPSILON);
        assert_eq!(record.start_temp, Some(12.0));
        assert_eq!(record.outside_temp, Some(-5.0));
        assert!(record.override_applied);

        let jobs = harness.jobs(SoakJob::CompleteZone);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].1.run_at, record.end_time);
        assert_eq!(sequencer.phase(&zone(A)), Some(ZonePhase::Heating));
        assert_eq!(sequencer.state().current(), Some(&zone(A)));
    }

    #[tokio::test]
    async fn should_complete_zone_and_finish_run_when_completion_job_fires() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();
        sequencer.begin_run().await.unwrap();

        harness.actuator.set_temperature(A, 18.5);
        complete_current(&harness, &mut sequencer).await;

        let record = sequencer.summary().zone(&zone(A)).unwrap();
        assert!(record.completed);
        assert_eq!(record.end_temp, Some(18.5));
        assert_eq!(releases(&harness.actuator.commands()), vec![zone(A)]);
        assert_eq!(sequencer.state(), &RunState::AllProcessed);
        assert_eq!(sequencer.queue().count(), 0);
        assert_eq!(sequencer.phase(&zone(A)), Some(ZonePhase::Monitoring));
        assert_eq!(harness.jobs(SoakJob::SampleTemperature).len(), 2);
        assert!(harness.jobs(SoakJob::CompleteZone).is_empty());
        assert!(sequencer.is_listening(&zone(A)));
    }

    #[tokio::test]
    async fn should_process_each_zone_once_in_queue_order() {
        let harness = Harness::new(&[(A, true, 12.0), (B, false, 12.0), (C, true, 11.0)]);
        let mut sequencer = harness.sequencer();
        sequencer.begin_run().await.unwrap();

        let mut completions = 0;
        while !harness.jobs(SoakJob::CompleteZone).is_empty() {
            complete_current(&harness, &mut sequencer).await;
            completions += 1;
        }

        let commands = harness.actuator.commands();
        assert_eq!(completions, 2);
        assert_eq!(overrides(&commands), vec![zone(A), zone(C)]);
        assert_eq!(releases(&commands), vec![zone(A), zone(C)]);
        let started: Vec<&ZoneId> = sequencer.summary().started_zones().collect();
        assert_eq!(started, vec![&zone(A), &zone(C)]);
        assert_eq!(sequencer.phase(&zone(B)), None);
        assert_eq!(sequencer.state(), &RunState::AllProcessed);
    }

    #[tokio::test]
    async fn should_transition_to_all_processed_when_no_zone_needs_treatment() {
        let harness = Harness::new(&[(A, false, 12.0)]);
        let mut sequencer = harness.sequencer();

        sequencer.begin_run().await.unwrap();

        assert_eq!(sequencer.state(), &RunState::AllProcessed);
        assert!(sequencer.summary().is_open());
        assert!(harness.actuator.commands().is_empty());
        assert!(harness.jobs(SoakJob::CompleteZone).is_empty());
    }

    #[tokio::test]
    async fn should_refuse_to_begin_run_when_day_is_open() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();
        sequencer.begin_run().await.unwrap();

        let err = sequencer.begin_run().await.unwrap_err();

        assert!(matches!(err, SoakError::State(StateError::DayInProgress)));
        assert_eq!(harness.actuator.commands().len(), 1);
    }

    #[tokio::test]
    async fn should_do_nothing_when_disabled() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        harness.modes.set_disabled(true);
        let mut sequencer = harness.sequencer();

        sequencer.begin_run().await.unwrap();

        assert_eq!(sequencer.state(), &RunState::Idle);
        assert!(!sequencer.summary().is_open());
        assert!(harness.actuator.commands().is_empty());
    }

    #[tokio::test]
    async fn should_store_forecast_snapshot_when_run_begins() {
        let mut harness = Harness::new(&[(A, true, 12.0)]);
        harness.forecast.snapshot = Some(ForecastSnapshot {
            min_temperature: Some(-8.0),
            ..ForecastSnapshot::default()
        });
        let mut sequencer = harness.sequencer();

        sequencer.begin_run().await.unwrap();

        let forecast = sequencer.summary().forecast.as_ref().unwrap();
        assert_eq!(forecast.min_temperature, Some(-8.0));
    }

    #[tokio::test]
    async fn should_start_without_forecast_when_source_fails() {
        let mut harness = Harness::new(&[(A, true, 12.0)]);
        harness.forecast.failing = true;
        let mut sequencer = harness.sequencer();

        sequencer.begin_run().await.unwrap();

        assert!(sequencer.summary().forecast.is_none());
        assert_eq!(sequencer.state().current(), Some(&zone(A)));
    }

    #[tokio::test]
    async fn should_record_missing_temperature_as_none_when_sensor_fails() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        harness.actuator.break_sensor(A);
        let mut sequencer = harness.sequencer();

        sequencer.begin_run().await.unwrap();
        complete_current(&harness, &mut sequencer).await;

        let record = sequencer.summary().zone(&zone(A)).unwrap();
        assert_eq!(record.start_temp, None);
        assert_eq!(record.end_temp, None);
        assert!(record.completed);
    }

    #[tokio::test]
    async fn should_continue_when_device_does_not_settle() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        harness.actuator.set_settles(false);
        let mut sequencer = harness.sequencer();

        sequencer.begin_run().await.unwrap();
        complete_current(&harness, &mut sequencer).await;

        assert_eq!(sequencer.state(), &RunState::AllProcessed);
        assert_eq!(harness.actuator.commands().len(), 2);
    }

    // ── modes and policies ─────────────────────────────────────────

    #[tokio::test]
    async fn should_record_everything_but_send_no_command_when_dry_run() {
        let harness = Harness::new(&[(A, true, 12.0), (B, true, 14.0)]);
        harness.modes.set_dry_run(true);
        let mut sequencer = harness.sequencer();

        sequencer.begin_run().await.unwrap();
        complete_current(&harness, &mut sequencer).await;
        complete_current(&harness, &mut sequencer).await;

        assert!(harness.actuator.commands().is_empty());
        let summary = sequencer.summary();
        assert_eq!(summary.completed_zones().count(), 2);
        assert!(summary.zones.iter().all(|record| !record.override_applied));
        assert_eq!(sequencer.state(), &RunState::AllProcessed);
    }

    #[tokio::test]
    async fn should_release_applied_override_when_dry_run_enabled_mid_zone() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();
        sequencer.begin_run().await.unwrap();

        harness.modes.set_dry_run(true);
        complete_current(&harness, &mut sequencer).await;

        assert_eq!(releases(&harness.actuator.commands()), vec![zone(A)]);
    }

    #[tokio::test]
    async fn should_skip_override_and_restore_when_duration_is_zero() {
        let mut harness = Harness::new(&[(A, true, 12.0)]);
        harness.config.zones[0].run_duration = Some(Duration::ZERO);
        let mut sequencer = harness.sequencer();

        sequencer.begin_run().await.unwrap();
        complete_current(&harness, &mut sequencer).await;

        assert!(harness.actuator.commands().is_empty());
        let record = sequencer.summary().zone(&zone(A)).unwrap();
        assert!(record.duration.abs() < f64::EPSILON);
        assert!(record.completed);
    }

    #[tokio::test]
    async fn should_restore_zero_length_zone_when_policy_is_always_restore() {
        let mut harness = Harness::new(&[(A, true, 12.0)]);
        harness.config.zones[0].run_duration = Some(Duration::ZERO);
        harness.config.zero_duration_policy = ZeroDurationPolicy::AlwaysRestore;
        let mut sequencer = harness.sequencer();

        sequencer.begin_run().await.unwrap();
        complete_current(&harness, &mut sequencer).await;

        assert_eq!(
            harness.actuator.commands(),
            vec![Command::Release(zone(A), 13.0)]
        );
    }

    #[tokio::test]
    async fn should_use_quick_durations_when_quick_run() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        harness.modes.set_quick_run(true);
        let mut sequencer = harness.sequencer();

        sequencer.begin_run().await.unwrap();
        let record = sequencer.summary().zone(&zone(A)).unwrap().clone();
        assert!((record.duration - 60.0).abs() < f64::EPSILON);

        complete_current(&harness, &mut sequencer).await;
        let samples = harness.jobs(SoakJob::SampleTemperature);
        let spread = samples[1].1.run_at - samples[0].1.run_at;
        assert_eq!(spread, chrono::Duration::seconds(30));
    }

    // ── errors ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_fail_with_not_found_when_completing_unknown_zone() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();

        let err = sequencer
            .complete_zone(CompletionPayload {
                zone: zone("climate.garage"),
                override_applied: true,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SoakError::NotFound(_)));
        assert!(harness.actuator.commands().is_empty());
    }

    #[tokio::test]
    async fn should_fail_with_not_found_when_sampling_unknown_zone() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();

        let err = sequencer
            .sample_temperature(ZonePayload {
                zone: zone("climate.garage"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SoakError::NotFound(_)));
    }

    #[tokio::test]
    async fn should_fail_start_up_check_when_zone_is_unknown() {
        let mut harness = Harness::new(&[(A, true, 12.0)]);
        harness
            .config
            .zones
            .push(ZonePlan::new(zone("climate.garage")));
        let sequencer = harness.sequencer();

        let err = sequencer.verify_zones().await.unwrap_err();
        assert!(matches!(err, SoakError::NotFound(_)));
    }

    // ── monitoring ─────────────────────────────────────────────────

    #[tokio::test]
    async fn should_record_unplanned_activity_after_zone_completes() {
        let harness = Harness::new(&[(A, true, 12.0), (B, true, 12.0)]);
        let mut sequencer = harness.sequencer();
        sequencer.begin_run().await.unwrap();
        complete_current(&harness, &mut sequencer).await;

        let started = now();
        sequencer
            .on_unplanned_activity(activity(A, HvacAction::Idle, HvacAction::Heating, started))
            .await
            .unwrap();
        sequencer
            .on_unplanned_activity(activity(
                A,
                HvacAction::Heating,
                HvacAction::Idle,
                started + chrono::Duration::seconds(90),
            ))
            .await
            .unwrap();
        // B is heating under the scheduler's control
        sequencer
            .on_unplanned_activity(activity(B, HvacAction::Idle, HvacAction::Heating, started))
            .await
            .unwrap();

        let actions = &sequencer.summary().zone(&zone(A)).unwrap().unplanned_hvac_actions;
        assert_eq!(actions.len(), 1);
        assert!(actions[0].completed);
        assert_eq!(actions[0].duration, Some(90.0));
        assert!(
            sequencer
                .summary()
                .zone(&zone(B))
                .unwrap()
                .unplanned_hvac_actions
                .is_empty()
        );
    }

    #[tokio::test]
    async fn should_ignore_unplanned_stop_when_nothing_is_open() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();
        sequencer.begin_run().await.unwrap();
        complete_current(&harness, &mut sequencer).await;

        sequencer
            .on_unplanned_activity(activity(A, HvacAction::Heating, HvacAction::Idle, now()))
            .await
            .unwrap();

        let record = sequencer.summary().zone(&zone(A)).unwrap();
        assert!(record.unplanned_hvac_actions.is_empty());
    }

    #[tokio::test]
    async fn should_finish_monitoring_when_every_sample_is_recorded() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();
        sequencer.begin_run().await.unwrap();
        complete_current(&harness, &mut sequencer).await;

        let samples = harness.jobs(SoakJob::SampleTemperature);
        harness.actuator.set_temperature(A, 17.0);
        sequencer.run_job(&samples[0].0).await.unwrap();
        assert_eq!(sequencer.phase(&zone(A)), Some(ZonePhase::Monitoring));

        harness.actuator.set_temperature(A, 16.0);
        sequencer.run_job(&samples[1].0).await.unwrap();

        let record = sequencer.summary().zone(&zone(A)).unwrap();
        let temperatures: Vec<f64> = record
            .temperature_records
            .iter()
            .map(|r| r.temperature)
            .collect();
        assert_eq!(temperatures, vec![17.0, 16.0]);
        assert_eq!(sequencer.phase(&zone(A)), Some(ZonePhase::Done));
    }

    // ── finalize ───────────────────────────────────────────────────

    #[tokio::test]
    async fn should_export_one_row_per_zone_when_day_is_finalized() {
        let harness = Harness::new(&[(A, true, 12.0), (B, true, 14.0)]);
        let mut sequencer = harness.sequencer();
        sequencer.begin_run().await.unwrap();
        complete_current(&harness, &mut sequencer).await;
        complete_current(&harness, &mut sequencer).await;

        let rows = sequencer.finalize_day().await.unwrap();

        assert_eq!(rows, 2);
        let exported = harness.sink.rows();
        assert_eq!(exported[0].zone_name, A);
        assert_eq!(exported[1].zone_name, B);
        assert_eq!(exported[0].zone_final_temp, Some(12.0));
        assert!(!sequencer.summary().is_open());
        assert_eq!(sequencer.state(), &RunState::Idle);
        assert!(!sequencer.is_listening(&zone(A)));
        assert!(harness.jobs(SoakJob::SampleTemperature).is_empty());
        assert!(harness.store.raw("daily:summary").is_none());
    }

    #[tokio::test]
    async fn should_export_nothing_when_finalizing_empty_day() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();

        assert_eq!(sequencer.finalize_day().await.unwrap(), 0);
        assert_eq!(sequencer.finalize_day().await.unwrap(), 0);

        assert_eq!(harness.sink.appends(), 0);
    }

    #[tokio::test]
    async fn should_refuse_to_finalize_while_zone_is_heating() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();
        sequencer.begin_run().await.unwrap();

        let err = sequencer.finalize_day().await.unwrap_err();

        assert!(matches!(err, SoakError::State(StateError::ZoneHeating(_))));
        assert!(sequencer.summary().is_open());
    }

    #[tokio::test]
    async fn should_keep_day_intact_when_export_fails() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();
        sequencer.begin_run().await.unwrap();
        complete_current(&harness, &mut sequencer).await;
        let samples = harness.jobs(SoakJob::SampleTemperature).len();
        assert!(samples > 0);
        harness.sink.fail_next_append();

        let err = sequencer.finalize_day().await.unwrap_err();

        assert!(matches!(err, SoakError::Export(_)));
        assert!(sequencer.summary().is_open());
        assert!(sequencer.is_listening(&zone(A)));
        assert_eq!(harness.jobs(SoakJob::SampleTemperature).len(), samples);
        let recorded = sequencer.summary().zone(&zone(A)).unwrap().temperature_records.len();

        sequencer
            .on_unplanned_activity(activity(A, HvacAction::Idle, HvacAction::Heating, now()))
            .await
            .unwrap();
        let record = sequencer.summary().zone(&zone(A)).unwrap();
        assert_eq!(record.unplanned_hvac_actions.len(), 1);
        assert_eq!(record.temperature_records.len(), recorded);

        assert_eq!(sequencer.finalize_day().await.unwrap(), 1);
        assert_eq!(harness.sink.rows().len(), 1);
        assert!(!sequencer.summary().is_open());
        assert!(harness.jobs(SoakJob::SampleTemperature).is_empty());
    }

    // ── recovery ───────────────────────────────────────────────────

    #[tokio::test]
    async fn should_resume_after_restart_without_reapplying_override() {
        let harness = Harness::new(&[(A, true, 12.0), (B, true, 14.0)]);
        {
            let mut before_crash = harness.sequencer();
            before_crash.begin_run().await.unwrap();
        }

        let mut sequencer = harness.sequencer();
        let recovery = sequencer.recover().await.unwrap();

        assert_eq!(recovery.restored_jobs, 1);
        assert!(recovery.repaired.is_empty());
        assert_eq!(recovery.queued, vec![zone(B)]);
        assert_eq!(overrides(&harness.actuator.commands()), vec![zone(A)]);
        assert_eq!(sequencer.state().current(), Some(&zone(A)));

        complete_current(&harness, &mut sequencer).await;

        let commands = harness.actuator.commands();
        assert_eq!(releases(&commands), vec![zone(A)]);
        assert_eq!(overrides(&commands), vec![zone(A), zone(B)]);
        assert_eq!(sequencer.state().current(), Some(&zone(B)));
    }

    #[tokio::test]
    async fn should_repair_missing_completion_job_when_recovering() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        {
            let mut before_crash = harness.sequencer();
            before_crash.begin_run().await.unwrap();
        }
        let lost = harness.only_job(SoakJob::CompleteZone);
        harness
            .store
            .delete(&StoreKeys::default().job_key(&lost))
            .await
            .unwrap();

        let mut sequencer = harness.sequencer();
        let recovery = sequencer.recover().await.unwrap();

        assert_eq!(recovery.repaired, vec![zone(A)]);
        let jobs = harness.jobs(SoakJob::CompleteZone);
        assert_eq!(jobs.len(), 1);
        let end_time = sequencer.summary().zone(&zone(A)).unwrap().end_time;
        assert_eq!(jobs[0].1.run_at, end_time);
    }

    #[tokio::test]
    async fn should_listen_to_completed_zones_after_restart() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        {
            let mut before_crash = harness.sequencer();
            before_crash.begin_run().await.unwrap();
            complete_current(&harness, &mut before_crash).await;
        }

        let mut sequencer = harness.sequencer();
        sequencer.recover().await.unwrap();

        assert_eq!(sequencer.state(), &RunState::AllProcessed);
        assert_eq!(sequencer.phase(&zone(A)), Some(ZonePhase::Monitoring));
        sequencer
            .on_unplanned_activity(activity(A, HvacAction::Idle, HvacAction::Heating, now()))
            .await
            .unwrap();
        let record = sequencer.summary().zone(&zone(A)).unwrap();
        assert_eq!(record.unplanned_hvac_actions.len(), 1);
        assert_eq!(releases(&harness.actuator.commands()), vec![zone(A)]);
    }

    #[tokio::test]
    async fn should_stay_idle_when_recovering_without_open_day() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();

        let recovery = sequencer.recover().await.unwrap();

        assert_eq!(recovery.restored_jobs, 0);
        assert_eq!(sequencer.state(), &RunState::Idle);
        assert_eq!(sequencer.queue().count(), 0);
    }

    // ── planning ───────────────────────────────────────────────────

    #[tokio::test]
    async fn should_schedule_run_at_forecast_window_when_away() {
        let mut harness = Harness::new(&[(A, true, 12.0)]);
        let window = now() + chrono::Duration::hours(3);
        harness.forecast.window = Some(window);
        let mut sequencer = harness.sequencer();

        let run_at = sequencer.plan_day().await.unwrap();

        assert_eq!(run_at, Some(window));
        let begin = harness.jobs(SoakJob::BeginRun);
        assert_eq!(begin[0].0.as_str(), BEGIN_RUN_JOB);
        assert_eq!(begin[0].1.run_at, window);
        let finalize = harness.jobs(SoakJob::FinalizeDay);
        assert_eq!(
            finalize[0].1.run_at,
            window + chrono::Duration::seconds(1200 + 3600 + 600)
        );
        assert_eq!(harness.only_job(SoakJob::PlanDay).as_str(), PLAN_DAY_JOB);
        assert!(sequencer.is_planned());
    }

    #[tokio::test]
    async fn should_fall_back_to_default_run_time_when_forecast_fails() {
        let mut harness = Harness::new(&[(A, true, 12.0)]);
        harness.forecast.failing = true;
        let mut sequencer = harness.sequencer();

        let run_at = sequencer.plan_day().await.unwrap().unwrap();

        assert!(run_at > now());
        assert_eq!(
            run_at.with_timezone(&chrono::Local).time(),
            harness.config.default_run_at
        );
    }

    #[tokio::test]
    async fn should_cancel_run_but_keep_planning_when_away_mode_is_off() {
        let mut harness = Harness::new(&[(A, true, 12.0)]);
        harness.forecast.window = Some(now() + chrono::Duration::hours(3));
        let mut sequencer = harness.sequencer();
        sequencer.plan_day().await.unwrap();

        harness.modes.set_away_mode(false);
        let run_at = sequencer.plan_day().await.unwrap();

        assert_eq!(run_at, None);
        assert!(harness.jobs(SoakJob::BeginRun).is_empty());
        assert_eq!(harness.jobs(SoakJob::PlanDay).len(), 1);
    }

    #[tokio::test]
    async fn should_finalize_stale_day_before_planning() {
        let harness = Harness::new(&[(A, true, 12.0)]);
        let mut sequencer = harness.sequencer();
        sequencer.begin_run().await.unwrap();
        complete_current(&harness, &mut sequencer).await;

        sequencer.plan_day().await.unwrap();

        assert_eq!(harness.sink.rows().len(), 1);
        assert!(!sequencer.summary().is_open());
    }

    #[tokio::test]
    async fn should_begin_run_when_planned_job_fires() {
        let mut harness = Harness::new(&[(A, true, 12.0)]);
        harness.forecast.window = Some(now() + chrono::Duration::hours(3));
        let mut sequencer = harness.sequencer();
        sequencer.plan_day().await.unwrap();

        let outcome = sequencer.run_job(&JobId::from(BEGIN_RUN_JOB)).await.unwrap();

        assert_eq!(outcome, FireOutcome::Ran);
        assert_eq!(sequencer.state().current(), Some(&zone(A)));
        assert!(harness.jobs(SoakJob::BeginRun).is_empty());
    }
}
