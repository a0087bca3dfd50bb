//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL pool, schema, migrations and the database
//!   probe, built on Diesel
//! - **generative**: generative AI API status probe
//!
//! Adapters translate infrastructure failures into `AppError` and contain no
//! business logic.

pub mod generative;
pub mod persistence;
