//! PostgreSQL persistence adapters built on Diesel.
//!
//! - [`pool`]: bb8 pool of async connections.
//! - [`schema`]: table definitions matching `migrations/`.
//! - [`migrations`]: embedded migrations applied at startup on request.
//! - [`error_mapping`]: pool and Diesel failures as [`crate::domain::AppError`].
//! - [`diesel_health_probe`]: [`crate::domain::DatabaseProbe`] adapters.

pub mod diesel_health_probe;
pub mod error_mapping;
pub mod migrations;
pub mod pool;
pub mod schema;

pub use diesel_health_probe::{DieselDatabaseProbe, UnconfiguredDatabaseProbe};
pub use error_mapping::{map_diesel_error, map_pool_error};
pub use migrations::run_pending_migrations;
pub use pool::{DbPool, PoolConfig, PoolError};
