//! API index at `/`.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::state::HttpState;

/// Human-readable API title.
pub const API_TITLE: &str = "PDF Summary & Mindmap API";

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiIndex {
    /// API title.
    #[schema(example = "PDF Summary & Mindmap API")]
    pub message: String,
    /// Build version.
    pub version: String,
    /// Swagger UI location; `null` when docs are disabled.
    pub docs_url: Option<String>,
    /// Basic health endpoint.
    pub health_check: String,
    /// Dependency health endpoint.
    pub detailed_health_check: String,
}

/// Describe the API and where to find its health checks.
#[utoipa::path(
    get,
    path = "/",
    tags = ["meta"],
    responses((status = 200, description = "API metadata", body = ApiIndex))
)]
#[get("/")]
pub async fn index(state: web::Data<HttpState>) -> web::Json<ApiIndex> {
    let info = &state.info;
    web::Json(ApiIndex {
        message: API_TITLE.to_owned(),
        version: info.version.clone(),
        docs_url: info.docs_enabled.then(|| "/docs".to_owned()),
        health_check: "/health".to_owned(),
        detailed_health_check: "/api/health".to_owned(),
    })
}
