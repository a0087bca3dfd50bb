//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ebook_summary::RequestIdentity;
use ebook_summary::doc::ApiDoc;
use ebook_summary::domain::HealthService;
use ebook_summary::inbound::http::health::HealthState;
use ebook_summary::inbound::http::state::HttpState;
use ebook_summary::inbound::http::{self, ErrorExposure};

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    exposure: ErrorExposure,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        exposure,
    } = deps;
    let docs_enabled = http_state.info.docs_enabled;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(exposure)
        .wrap(RequestIdentity);

    // Swagger UI must be registered before the JSON 404 fallback.
    let app = if docs_enabled {
        app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        app
    };

    app.configure(http::configure)
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        exposure,
        info,
        database,
        generative_api,
    } = config;
    let health = HealthService::new(database, generative_api, Arc::new(DefaultClock));
    let http_state = web::Data::new(HttpState::new(health, info));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            exposure,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
