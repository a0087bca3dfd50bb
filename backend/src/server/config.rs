//! HTTP server configuration object and helpers.

use std::sync::Arc;

use ebook_summary::domain::ports::{DatabaseProbe, GenerativeApiProbe};
use ebook_summary::inbound::http::ErrorExposure;
use ebook_summary::inbound::http::state::ServiceInfo;
use ebook_summary::outbound::generative::ApiKeyPresenceProbe;
use ebook_summary::outbound::persistence::{DbPool, DieselDatabaseProbe, UnconfiguredDatabaseProbe};
use ebook_summary::settings::RuntimeConfig;

/// Everything needed to build the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: (String, u16),
    pub(crate) exposure: ErrorExposure,
    pub(crate) info: ServiceInfo,
    pub(crate) database: Arc<dyn DatabaseProbe>,
    pub(crate) generative_api: Arc<dyn GenerativeApiProbe>,
}

impl ServerConfig {
    /// Derive the server configuration from validated settings.
    ///
    /// Without a pool the database probe always reports an error.
    #[must_use]
    pub fn new(config: &RuntimeConfig, db_pool: Option<DbPool>) -> Self {
        let database: Arc<dyn DatabaseProbe> = match db_pool {
            Some(pool) => Arc::new(DieselDatabaseProbe::new(pool)),
            None => Arc::new(UnconfiguredDatabaseProbe),
        };
        Self {
            bind_addr: (config.host.clone(), config.port),
            exposure: ErrorExposure::from_debug(config.debug),
            info: ServiceInfo::new(
                config.app_name.clone(),
                config.environment.as_str(),
                config.debug,
            ),
            database,
            generative_api: Arc::new(ApiKeyPresenceProbe::new(config.generative.has_api_key())),
        }
    }
}
