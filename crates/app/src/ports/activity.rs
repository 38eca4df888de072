//! Activity port — publish externally observed HVAC action changes.

use std::future::Future;

use heatsoak_domain::error::SoakError;
use heatsoak_domain::hvac::HvacActivity;

/// Publishes [`HvacActivity`] observations to interested listeners.
pub trait ActivityPublisher {
    fn publish(&self, activity: HvacActivity)
    -> impl Future<Output = Result<(), SoakError>> + Send;
}

impl<T: ActivityPublisher + Send + Sync> ActivityPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        activity: HvacActivity,
    ) -> impl Future<Output = Result<(), SoakError>> + Send {
        (**self).publish(activity)
    }
}
