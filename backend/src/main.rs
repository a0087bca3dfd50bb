//! Backend entry-point: loads configuration, prepares storage and the
//! database, then serves the HTTP API.

mod server;

use std::process::ExitCode;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{error, info, warn};

use ebook_summary::inbound::http::health::HealthState;
use ebook_summary::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use ebook_summary::settings::{AppSettings, LoggingSettings, RuntimeConfig, ensure_directories};
use ebook_summary::telemetry::{TracingInstall, install_tracing};

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(message) => {
            // Tracing is not configured yet; use the default settings.
            if report_install(install_tracing(&LoggingSettings::default())) {
                error!(error = %message, "invalid configuration");
            } else {
                eprintln!("invalid configuration: {message}");
            }
            return ExitCode::FAILURE;
        }
    };

    report_install(install_tracing(&config.logging));

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server terminated");
            ExitCode::FAILURE
        }
    }
}

/// Logs how tracing came up; `false` when no subscriber of ours is active.
fn report_install(outcome: TracingInstall) -> bool {
    match outcome {
        TracingInstall::Configured => true,
        TracingInstall::Fallback(e) => {
            warn!(error = %e, "configured tracing failed; using plain text output");
            true
        }
        TracingInstall::Unavailable(e) => {
            eprintln!("tracing unavailable: {e}");
            false
        }
    }
}

fn load_config() -> Result<RuntimeConfig, String> {
    let settings = AppSettings::load_from_iter(std::env::args_os()).map_err(|e| e.to_string())?;
    settings.validate().map_err(|e| e.to_string())
}

async fn run(config: RuntimeConfig) -> std::io::Result<()> {
    info!(
        app_name = %config.app_name,
        environment = config.environment.as_str(),
        debug = config.debug,
        "starting"
    );
    ensure_directories(&config.uploads).map_err(std::io::Error::other)?;

    let db_pool = match &config.database {
        Some(database) => {
            if database.run_migrations {
                run_pending_migrations(database.url.as_str())
                    .await
                    .map_err(std::io::Error::other)?;
            }
            let pool_config = PoolConfig::new(database.url.as_str())
                .with_max_size(database.pool_size)
                .with_connection_timeout(database.pool_timeout);
            Some(DbPool::new(pool_config).await.map_err(std::io::Error::other)?)
        }
        None => {
            warn!("no database URL configured; database health will report errors");
            None
        }
    };

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, ServerConfig::new(&config, db_pool))?;
    info!(host = %config.host, port = config.port, "listening");
    server.await
}
