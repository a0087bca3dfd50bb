//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use crate::domain::HealthService;

/// Identity and exposure flags reported by informational endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Configured application name.
    pub app_name: String,
    /// Deployment environment label.
    pub environment: String,
    /// Build version.
    pub version: String,
    /// Whether interactive API docs are mounted at `/docs`.
    pub docs_enabled: bool,
}

impl ServiceInfo {
    /// Info for this build, with the crate version.
    pub fn new(
        app_name: impl Into<String>,
        environment: impl Into<String>,
        docs_enabled: bool,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            environment: environment.into(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            docs_enabled,
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Dependency health aggregation.
    pub health: HealthService,
    /// Service identity.
    pub info: ServiceInfo,
}

impl HttpState {
    /// Bundle the handler dependencies.
    pub fn new(health: HealthService, info: ServiceInfo) -> Self {
        Self { health, info }
    }
}
