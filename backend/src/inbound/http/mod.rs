//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod error;
pub mod health;
pub mod root;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorExposure, ErrorResponse};

/// Paths served by [`configure`]; other methods on them answer 405.
pub const ROUTED_PATHS: [&str; 5] = [
    "/",
    "/health",
    "/api/health",
    "/health/ready",
    "/health/live",
];

/// Register every route, the JSON body error handler, and the JSON 404 and
/// 405 fallbacks.
///
/// Handlers expect `web::Data<HttpState>` and `web::Data<HealthState>` in app
/// data; [`ErrorExposure`] defaults to redacted when not registered.
///
/// [`HttpState`]: state::HttpState
/// [`HealthState`]: health::HealthState
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .service(root::index)
        .service(health::health)
        .service(health::api_health)
        .service(health::ready)
        .service(health::live)
        .service(web::resource(ROUTED_PATHS).to(error::method_not_allowed))
        .default_service(web::to(error::not_found));
}
