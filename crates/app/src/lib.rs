//! # heatsoak-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `JobStore` — durable key/value store shared by jobs and the daily summary
//!   - `Actuator` — override, release and read the controlled zones
//!   - `ForecastSource` — best run window and the day's forecast snapshot
//!   - `ReportSink` — append-only export of finished days
//!   - `ModeFlags` — dry-run, quick-run, disabled, away mode
//!   - `ActivityPublisher` — externally observed HVAC activity
//! - Provide the use-cases:
//!   - `Scheduler` — durable one-shot jobs, restored after a restart
//!   - `SummaryStore` — persistence of the daily summary
//!   - `ZoneSequencer` — the one-zone-at-a-time soak run
//! - Provide **in-process infrastructure** (activity bus, event loop) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `heatsoak-domain` only (plus `tokio` for timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod activity_bus;
pub mod event_loop;
pub mod ports;
pub mod scheduler;
pub mod sequencer;
pub mod summary_store;

#[cfg(test)]
mod testing;
