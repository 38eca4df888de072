//! Time and timestamp helpers.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Timezone-aware UTC timestamp used for run times, samples and summaries.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Signed number of seconds elapsed from `from` to `to`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn seconds_between(from: Timestamp, to: Timestamp) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Delay until `at`, floored at zero when `at` is already past.
#[must_use]
pub fn delay_until(at: Timestamp, now: Timestamp) -> Duration {
    (at - now).to_std().unwrap_or(Duration::ZERO)
}

/// Add a std duration to a timestamp, saturating on overflow.
#[must_use]
pub fn add(at: Timestamp, duration: Duration) -> Timestamp {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
