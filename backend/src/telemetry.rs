//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::settings::{LogFormat, LoggingSettings};

/// Filter for the configured level; a non-empty `RUST_LOG` takes precedence.
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.level.directive()))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails when a global subscriber is already installed. See
/// [`install_tracing`] for the fallback used at startup.
pub fn init_tracing(settings: &LoggingSettings) -> Result<(), BoxError> {
    let builder = fmt().with_env_filter(env_filter(settings));
    match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
}

/// Outcome of [`install_tracing`].
#[derive(Debug)]
pub enum TracingInstall {
    /// The configured subscriber is active.
    Configured,
    /// The configured subscriber failed; plain text output is active instead.
    Fallback(BoxError),
    /// Neither subscriber could be installed, usually because another global
    /// subscriber already exists.
    Unavailable(BoxError),
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install the configured subscriber, falling back to plain text output so
/// startup failures are still reported.
pub fn install_tracing(settings: &LoggingSettings) -> TracingInstall {
    match init_tracing(settings) {
        Ok(()) => TracingInstall::Configured,
        Err(error) => match fmt().with_env_filter(env_filter(settings)).try_init() {
            Ok(()) => TracingInstall::Fallback(error),
            Err(_) => TracingInstall::Unavailable(error),
        },
    }
}
