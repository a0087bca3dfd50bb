//! Graceful degradation: substitute a fallback value for selected failures.
//!
//! Callers choose which failures are absorbed through a predicate; anything
//! the predicate rejects propagates unchanged. Absorbed failures are logged
//! and never escalate.

use std::fmt::Display;
use std::future::Future;

use tracing::warn;

/// Predicate accepting every failure.
pub fn catch_all<E>(_: &E) -> bool {
    true
}

/// Run `operation`, returning `fallback` when it fails with an error accepted
/// by `should_catch`.
///
/// # Errors
///
/// Returns the operation's error when `should_catch` rejects it.
///
/// # Examples
/// ```
/// use ebook_summary::domain::degradation::{catch_all, with_fallback};
///
/// let pages = with_fallback(
///     "count_pages",
///     || "x".parse::<u32>(),
///     0,
///     catch_all,
/// );
/// assert_eq!(pages, Ok(0));
/// ```
pub fn with_fallback<T, E, F, P>(
    operation_name: &str,
    operation: F,
    fallback: T,
    should_catch: P,
) -> Result<T, E>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
    P: FnOnce(&E) -> bool,
{
    match operation() {
        Ok(value) => Ok(value),
        Err(error) => {
            if !should_catch(&error) {
                return Err(error);
            }
            warn!(operation = operation_name, error = %error, "operation failed; using fallback");
            Ok(fallback)
        }
    }
}

/// Async form of [`with_fallback`].
///
/// # Errors
///
/// Returns the operation's error when `should_catch` rejects it.
pub async fn with_fallback_async<T, E, Fut, P>(
    operation_name: &str,
    operation: Fut,
    fallback: T,
    should_catch: P,
) -> Result<T, E>
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
    P: FnOnce(&E) -> bool,
{
    match operation.await {
        Ok(value) => Ok(value),
        Err(error) => {
            if !should_catch(&error) {
                return Err(error);
            }
            warn!(operation = operation_name, error = %error, "operation failed; using fallback");
            Ok(fallback)
        }
    }
}
