//! In-process activity bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use heatsoak_domain::error::SoakError;
use heatsoak_domain::hvac::{HvacActivity, Transition};

use crate::ports::ActivityPublisher;

/// In-process activity bus using a tokio [`broadcast`] channel.
///
/// Only changes that start or stop an HVAC action are forwarded; a change
/// between two inactive actions (`off` to `idle`) never reaches the
/// subscribers. Publishing succeeds even when nobody listens.
pub struct InProcessActivityBus {
    sender: broadcast::Sender<HvacActivity>,
}

impl InProcessActivityBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to observations published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HvacActivity> {
        self.sender.subscribe()
    }
}

impl ActivityPublisher for InProcessActivityBus {
    fn publish(
        &self,
        activity: HvacActivity,
    ) -> impl Future<Output = Result<(), SoakError>> + Send {
        if matches!(activity.transition(), Transition::Other) {
            tracing::trace!(
                zone = %activity.zone,
                from = %activity.from,
                to = %activity.to,
                "hvac change not forwarded"
            );
        } else {
            // send only fails without receivers, which is fine.
            let _ = self.sender.send(activity);
        }
        async { Ok(()) }
    }
}
