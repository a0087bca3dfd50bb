//! Backend library modules for the PDF summary and mindmap service.
//!
//! - [`domain`]: error taxonomy, retry/backoff, graceful degradation, upload
//!   validation, and dependency health.
//! - [`inbound`]: HTTP adapter.
//! - [`outbound`]: PostgreSQL and generative API adapters.
//! - [`settings`] and [`telemetry`]: startup configuration and logging.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::RequestIdentity;
