//! Health endpoints.
//!
//! - `/health/ready` and `/health/live`: orchestration probes backed by
//!   [`HealthState`].
//! - `/health`: cheap process check with service identity.
//! - `/api/health`: dependency report from [`crate::domain::HealthService`];
//!   always 200, degradation is reported in the body.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::HealthReport;

use super::state::HttpState;

/// Shared readiness and liveness flags.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Readiness probe. 200 once startup completed, 503 before.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe. 200 while alive, 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ServiceStatus {
    /// Always `ok` while the process answers.
    #[schema(example = "ok")]
    pub status: String,
    /// Configured application name.
    pub app_name: String,
    /// Deployment environment.
    #[schema(example = "development")]
    pub environment: String,
    /// Build version.
    #[schema(example = "1.0.0")]
    pub version: String,
}

/// Basic health check; no dependencies are probed.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["health"],
    responses((status = 200, description = "Process is running", body = ServiceStatus))
)]
#[get("/health")]
pub async fn health(state: web::Data<HttpState>) -> web::Json<ServiceStatus> {
    let info = &state.info;
    web::Json(ServiceStatus {
        status: "ok".to_owned(),
        app_name: info.app_name.clone(),
        environment: info.environment.clone(),
        version: info.version.clone(),
    })
}

/// Detailed health check probing the database and the generative AI API.
#[utoipa::path(
    get,
    path = "/api/health",
    tags = ["health"],
    responses((
        status = 200,
        description = "Dependency report; `status` is `degraded` when any component fails",
        body = HealthReport
    ))
)]
#[get("/api/health")]
pub async fn api_health(state: web::Data<HttpState>) -> web::Json<HealthReport> {
    web::Json(state.health.check().await)
}
