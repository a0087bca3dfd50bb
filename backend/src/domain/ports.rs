//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (databases, upstream APIs). Failures cross the boundary as [`AppError`]
//! so adapters map their errors into the shared taxonomy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AppResult;

/// Port for checking database reachability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    /// Run a trivial round trip against the database.
    async fn ping(&self) -> AppResult<()>;
}

/// Reachability of the generative AI API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerativeApiStatus {
    /// Configured and usable.
    Ok,
    /// Missing configuration or failing calls.
    Error,
    /// Usable but currently throttled.
    RateLimited,
}

/// Port for checking the generative AI API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeApiProbe: Send + Sync {
    /// Report whether the API can currently be used.
    async fn status(&self) -> GenerativeApiStatus;
}
