//! # heatsoak-domain
//!
//! Pure domain model for the heatsoak zone-processing automation.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Job records** (durable descriptors of deferred actions)
//! - Define **HVAC actions** and the activity transitions observed on a zone
//! - Define the **Zone Summary** and **Daily Summary** aggregates
//! - Define the **report rows** exported once per zone and per day
//! - Define the per-zone and global **phases** of a soak run
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod forecast;
pub mod hvac;
pub mod job;
pub mod phase;
pub mod summary;
