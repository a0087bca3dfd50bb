//! Database reachability probes.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::domain::ports::DatabaseProbe;
use crate::domain::{AppError, ErrorKind};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;

/// Runs `SELECT 1` on a pooled connection.
#[derive(Clone)]
pub struct DieselDatabaseProbe {
    pool: DbPool,
}

impl DieselDatabaseProbe {
    /// Probe backed by `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseProbe for DieselDatabaseProbe {
    async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}

/// Stand-in used when no database URL is configured; always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredDatabaseProbe;

#[async_trait]
impl DatabaseProbe for UnconfiguredDatabaseProbe {
    async fn ping(&self) -> Result<(), AppError> {
        Err(AppError::new(
            ErrorKind::ConfigurationError,
            "database URL is not configured",
        ))
    }
}
