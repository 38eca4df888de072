//! Forecast source port — weather context for planning and reporting.

use std::future::Future;

use heatsoak_domain::error::SoakError;
use heatsoak_domain::forecast::ForecastSnapshot;
use heatsoak_domain::time::Timestamp;

pub trait ForecastSource {
    /// Best moment to start a run lasting `duration_minutes`, if the source
    /// has an opinion.
    fn best_window(
        &self,
        duration_minutes: u64,
    ) -> impl Future<Output = Result<Option<Timestamp>, SoakError>> + Send;

    /// Snapshot of the day's forecast, stored as-is in the daily summary.
    fn daily_summary(
        &self,
    ) -> impl Future<Output = Result<Option<ForecastSnapshot>, SoakError>> + Send;
}
