//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the health and index endpoints together with the
//! error body and error code schemas every endpoint may return. Swagger UI
//! serves it at `/docs` in debug exposure; `openapi-dump` prints it for
//! external tooling.

use utoipa::OpenApi;

use crate::domain::{ErrorKind, HealthReport};
use crate::inbound::http::ErrorResponse;
use crate::inbound::http::health::ServiceStatus;
use crate::inbound::http::root::ApiIndex;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PDF Summary & Mindmap API",
        description = "Health, metadata, and error contract of the ebook summary backend."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::root::index,
        crate::inbound::http::health::health,
        crate::inbound::http::health::api_health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorResponse, ErrorKind, HealthReport, ServiceStatus, ApiIndex)),
    tags(
        (name = "health", description = "Endpoints for health checks"),
        (name = "meta", description = "API metadata")
    )
)]
pub struct ApiDoc;
