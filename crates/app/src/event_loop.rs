//! The single event loop: timer notifications and observed HVAC activity,
//! dispatched one at a time to the sequencer.

use std::future::Future;

use tokio::sync::{broadcast, mpsc};

use heatsoak_domain::hvac::HvacActivity;

use crate::ports::{Actuator, ForecastSource, JobStore, ModeFlags, ReportSink};
use crate::scheduler::FiredTimer;
use crate::sequencer::ZoneSequencer;

/// Drive `sequencer` until `shutdown` resolves.
///
/// Each handler runs to completion before the next event is taken. A failing
/// handler is logged and the loop keeps going.
pub async fn run<S, A, F, R, M>(
    sequencer: &mut ZoneSequencer<S, A, F, R, M>,
    timers: &mut mpsc::UnboundedReceiver<FiredTimer>,
    activity: &mut broadcast::Receiver<HvacActivity>,
    shutdown: impl Future<Output = ()>,
) where
    S: JobStore + Clone,
    A: Actuator,
    F: ForecastSource,
    R: ReportSink,
    M: ModeFlags,
{
    tokio::pin!(shutdown);
    let mut activity_open = true;

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("shutdown requested, leaving event loop");
                break;
            }
            fired = timers.recv() => {
                let Some(fired) = fired else {
                    tracing::warn!("timer channel closed, leaving event loop");
                    break;
                };
                let job_id = fired.job_id.clone();
                if let Err(err) = sequencer.on_timer(fired).await {
                    tracing::error!(job_id = %job_id, error = %err, "scheduled job failed");
                }
            }
            received = activity.recv(), if activity_open => match received {
                Ok(observed) => {
                    if let Err(err) = sequencer.on_unplanned_activity(observed).await {
                        tracing::error!(error = %err, "failed to record hvac activity");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "activity listener lagged, observations lost");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("activity channel closed");
                    activity_open = false;
                }
            },
        }
    }
}
