//! Domain primitives and services.
//!
//! Purpose: define the failure taxonomy, the retry and degradation policies
//! built on it, upload validation rules, and dependency health reporting.
//! Nothing in this module knows about HTTP or Diesel; adapters translate at
//! the edges.
//!
//! Public surface:
//! - AppError / ErrorKind: structured failures and their status mapping.
//! - RetryPolicy / RetryExecutor / BlockingRetryExecutor: exponential backoff.
//! - UploadValidator: PDF upload checks.
//! - HealthService: dependency health aggregation.

pub mod degradation;
pub mod error;
pub mod health;
pub mod ports;
pub mod retry;
pub mod upload;

pub use self::error::{AppError, ErrorKind, ErrorPayload, status_for, status_for_code};
pub use self::health::{ComponentStatus, HealthReport, HealthService, OverallStatus};
pub use self::ports::{DatabaseProbe, GenerativeApiProbe, GenerativeApiStatus};
pub use self::retry::{BlockingRetryExecutor, RetryExecutor, RetryPolicy};
pub use self::upload::{UploadValidationError, UploadValidator};

/// Convenient domain result alias.
pub type AppResult<T> = Result<T, AppError>;
