//! Dependency health aggregation.
//!
//! [`HealthService`] asks each probe for its status and folds the answers
//! into a [`HealthReport`]. Probe failures never escape: they degrade the
//! affected component to `error` and the report to `degraded`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AppError;
use super::degradation::{catch_all, with_fallback_async};
use super::ports::{DatabaseProbe, GenerativeApiProbe, GenerativeApiStatus};

/// Status of a single dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// Dependency responded.
    Ok,
    /// Dependency failed or is unconfigured.
    Error,
}

/// Aggregate service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every dependency is healthy.
    Ok,
    /// At least one dependency is unhealthy.
    Degraded,
}

/// Detailed health snapshot returned by `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    /// `ok` only when every component is `ok`.
    pub status: OverallStatus,
    /// Database reachability.
    pub database: ComponentStatus,
    /// Generative AI API reachability.
    pub gemini_api: GenerativeApiStatus,
    /// When the snapshot was taken.
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    fn from_components(
        database: ComponentStatus,
        gemini_api: GenerativeApiStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let healthy =
            database == ComponentStatus::Ok && gemini_api == GenerativeApiStatus::Ok;
        Self {
            status: if healthy {
                OverallStatus::Ok
            } else {
                OverallStatus::Degraded
            },
            database,
            gemini_api,
            timestamp,
        }
    }
}

/// Aggregates dependency probes into a [`HealthReport`].
#[derive(Clone)]
pub struct HealthService {
    database: Arc<dyn DatabaseProbe>,
    generative_api: Arc<dyn GenerativeApiProbe>,
    clock: Arc<dyn Clock>,
}

impl HealthService {
    /// Build the service from its probes and a clock.
    pub fn new(
        database: Arc<dyn DatabaseProbe>,
        generative_api: Arc<dyn GenerativeApiProbe>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            database,
            generative_api,
            clock,
        }
    }

    /// Probe every dependency and report.
    pub async fn check(&self) -> HealthReport {
        let database = with_fallback_async(
            "database_health_check",
            async {
                self.database.ping().await?;
                Ok::<_, AppError>(ComponentStatus::Ok)
            },
            ComponentStatus::Error,
            catch_all,
        )
        .await
        .unwrap_or(ComponentStatus::Error);
        let gemini_api = self.generative_api.status().await;
        HealthReport::from_components(database, gemini_api, self.clock.utc())
    }
}
