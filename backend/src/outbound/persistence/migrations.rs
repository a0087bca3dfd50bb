//! Embedded schema migrations.
//!
//! Migrations run on a synchronous `PgConnection` inside
//! `spawn_blocking`; `diesel_migrations` has no async harness.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::domain::{AppError, ErrorKind};

use super::error_mapping::DB_ERROR_DETAIL;

/// Migrations compiled from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply every pending migration and return how many ran.
///
/// # Errors
///
/// `DB_CONNECTION_ERROR` (retryable) when the database cannot be reached,
/// `DB_ERROR` when a migration fails, `INTERNAL_ERROR` when the blocking
/// task panics.
pub async fn run_pending_migrations(database_url: &str) -> Result<usize, AppError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || migrate(&url))
        .await
        .map_err(|err| {
            AppError::internal("migration task failed").with_detail("exception", err.to_string())
        })??;
    info!(applied, "database migrations complete");
    Ok(applied)
}

fn migrate(url: &str) -> Result<usize, AppError> {
    let mut conn = PgConnection::establish(url).map_err(|err| {
        AppError::new(ErrorKind::DbConnectionError, "database connection error")
            .with_detail(DB_ERROR_DETAIL, err.to_string())
            .with_retryable(true)
    })?;
    let versions = conn.run_pending_migrations(MIGRATIONS).map_err(|err| {
        AppError::new(ErrorKind::DbError, "database migration failed")
            .with_detail(DB_ERROR_DETAIL, err.to_string())
    })?;
    Ok(versions.len())
}
