//! # heatsoak-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `JobStore` port trait defined in `heatsoak-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Make every successful write durable before it returns
//!
//! ## Dependency rule
//! Depends on `heatsoak-app` (for port traits) and `heatsoak-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod job_store;
pub mod pool;

pub use job_store::SqliteJobStore;
pub use pool::{Config, Database};
