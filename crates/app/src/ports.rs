//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod activity;
pub mod actuator;
pub mod forecast;
pub mod job_store;
pub mod modes;
pub mod report_sink;

pub use activity::ActivityPublisher;
pub use actuator::Actuator;
pub use forecast::ForecastSource;
pub use job_store::{JobStore, StoreKeys};
pub use modes::{ModeFlags, SharedModes};
pub use report_sink::ReportSink;
