//! Fixed forecast — answers with whatever it was built with.

use heatsoak_app::ports::ForecastSource;
use heatsoak_domain::error::SoakError;
use heatsoak_domain::forecast::ForecastSnapshot;
use heatsoak_domain::time::Timestamp;

/// Forecast source with a preset window and snapshot. Without a window the
/// sequencer falls back to its default run time.
#[derive(Debug, Clone, Default)]
pub struct FixedForecast {
    window: Option<Timestamp>,
    snapshot: Option<ForecastSnapshot>,
}

impl FixedForecast {
    #[must_use]
    pub fn with_window(mut self, window: Timestamp) -> Self {
        self.window = Some(window);
        self
    }

    #[must_use]
    pub fn with_snapshot(mut self, snapshot: ForecastSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

impl ForecastSource for FixedForecast {
    async fn best_window(&self, _duration_minutes: u64) -> Result<Option<Timestamp>, SoakError> {
        Ok(self.window)
    }

    async fn daily_summary(&self) -> Result<Option<ForecastSnapshot>, SoakError> {
        Ok(self.snapshot.clone())
    }
}
