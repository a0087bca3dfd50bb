//! Retry with exponential backoff.
//!
//! One decision core ([`RetrySchedule`]) drives two executors that differ only
//! in how they wait between attempts: [`RetryExecutor`] suspends the calling
//! task through a [`RetrySleeper`], while [`BlockingRetryExecutor`] parks the
//! calling thread through a [`BlockingSleeper`]. Both make the same number of
//! attempts and observe the same delays.
//!
//! The async executor defines no cancellation primitive of its own. Dropping
//! the future (for example when a `tokio::time::timeout` elapses) while it is
//! waiting between attempts ends the loop without further attempts.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::error::{AppError, ErrorKind};

/// Kinds retried when a policy does not name its own set.
///
/// Covers transient upstream throttling and timeouts, generic upstream API
/// failures, and lost database connections.
pub const DEFAULT_RETRYABLE_KINDS: [ErrorKind; 4] = [
    ErrorKind::RateLimited,
    ErrorKind::Timeout,
    ErrorKind::ApiError,
    ErrorKind::DbConnectionError,
];

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
/// Default upper bound for any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
/// Default multiplier applied per retry.
pub const DEFAULT_EXPONENTIAL_BASE: f64 = 2.0;

/// Rejected policy parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetryPolicyError {
    /// The initial delay was zero.
    #[error("initial retry delay must be greater than zero")]
    ZeroInitialDelay,
    /// The delay cap is shorter than the first delay.
    #[error("max retry delay {max:?} is shorter than the initial delay {initial:?}")]
    MaxDelayBelowInitial {
        /// Requested initial delay.
        initial: Duration,
        /// Requested cap.
        max: Duration,
    },
    /// The growth factor does not grow.
    #[error("exponential base must be a finite number greater than 1, got {base}")]
    InvalidExponentialBase {
        /// Requested base.
        base: f64,
    },
}

/// Immutable retry parameters.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use ebook_summary::domain::retry::RetryPolicy;
///
/// let policy = RetryPolicy::builder()
///     .max_retries(5)
///     .max_delay(Duration::from_secs(2))
///     .build()
///     .expect("valid policy");
/// assert_eq!(policy.delay_for_retry(4), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    exponential_base: f64,
    retryable_kinds: HashSet<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            exponential_base: DEFAULT_EXPONENTIAL_BASE,
            retryable_kinds: DEFAULT_RETRYABLE_KINDS.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Start from the defaults and override selectively.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: Self::default(),
        }
    }

    /// Retries allowed after the first attempt.
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Upper bound on attempts, including the first.
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the first retry.
    pub const fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Cap applied to every delay.
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Growth factor between consecutive delays.
    pub const fn exponential_base(&self) -> f64 {
        self.exponential_base
    }

    /// Kinds treated as transient.
    pub const fn retryable_kinds(&self) -> &HashSet<ErrorKind> {
        &self.retryable_kinds
    }

    /// Delay slept after the failed attempt `retry_index + 1`.
    ///
    /// `min(initial_delay * exponential_base ^ retry_index, max_delay)`.
    pub fn delay_for_retry(&self, retry_index: u32) -> Duration {
        let exponent = i32::try_from(retry_index).unwrap_or(i32::MAX);
        let seconds = self.initial_delay.as_secs_f64() * self.exponential_base.powi(exponent);
        Duration::try_from_secs_f64(seconds)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Classify an [`AppError`]: explicitly retryable, or of a retryable kind.
    pub fn is_retryable(&self, error: &AppError) -> bool {
        error.is_retryable() || self.retryable_kinds.contains(&error.kind())
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Retries allowed after the first attempt. Zero means a single attempt.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    /// Delay before the first retry; must be non-zero.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.policy.initial_delay = delay;
        self
    }

    /// Cap for every delay; must not be below the initial delay.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Growth factor; must be finite and greater than one.
    pub fn exponential_base(mut self, base: f64) -> Self {
        self.policy.exponential_base = base;
        self
    }

    /// Replace the retryable kind set.
    pub fn retryable_kinds(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.policy.retryable_kinds = kinds.into_iter().collect();
        self
    }

    /// Validate and produce the policy.
    ///
    /// # Errors
    ///
    /// Returns [`RetryPolicyError`] when the delays or base cannot produce a
    /// non-decreasing, capped schedule.
    pub fn build(self) -> Result<RetryPolicy, RetryPolicyError> {
        let policy = self.policy;
        if policy.initial_delay.is_zero() {
            return Err(RetryPolicyError::ZeroInitialDelay);
        }
        if policy.max_delay < policy.initial_delay {
            return Err(RetryPolicyError::MaxDelayBelowInitial {
                initial: policy.initial_delay,
                max: policy.max_delay,
            });
        }
        if !policy.exponential_base.is_finite() || policy.exponential_base <= 1.0 {
            return Err(RetryPolicyError::InvalidExponentialBase {
                base: policy.exponential_base,
            });
        }
        Ok(policy)
    }
}

/// Outcome of recording a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay`, then make another attempt.
    Retry {
        /// 1-based number of the attempt that just failed.
        attempt: u32,
        /// Time to wait before the next attempt.
        delay: Duration,
    },
    /// The failure is not transient; surface it.
    NotRetryable {
        /// 1-based number of the attempt that failed.
        attempt: u32,
    },
    /// Every allowed attempt has failed; surface the last failure.
    Exhausted {
        /// Total attempts made.
        attempts: u32,
    },
}

/// Per-call attempt counter shared by both executors.
///
/// Each executor call owns a fresh schedule, so concurrent calls never share
/// attempt or delay state.
#[derive(Debug)]
pub struct RetrySchedule<'a> {
    policy: &'a RetryPolicy,
    attempt: u32,
}

impl<'a> RetrySchedule<'a> {
    /// Begin a schedule positioned on the first attempt.
    pub const fn new(policy: &'a RetryPolicy) -> Self {
        Self { policy, attempt: 1 }
    }

    /// 1-based number of the attempt about to run or in flight.
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failure of the current attempt and decide what happens next.
    pub fn record_failure(&mut self, retryable: bool) -> RetryDecision {
        let attempt = self.attempt;
        if !retryable {
            return RetryDecision::NotRetryable { attempt };
        }
        if attempt > self.policy.max_retries {
            return RetryDecision::Exhausted { attempts: attempt };
        }
        self.attempt = attempt.saturating_add(1);
        RetryDecision::Retry {
            attempt,
            delay: self.policy.delay_for_retry(attempt - 1),
        }
    }

    /// Record a failure, emit diagnostics, notify the observer, and return the
    /// delay to wait, or `None` when the failure must be surfaced.
    fn next_delay<E, O>(
        &mut self,
        label: &str,
        failure: &E,
        retryable: bool,
        on_retry: &mut O,
    ) -> Option<Duration>
    where
        E: fmt::Display,
        O: FnMut(&E, u32, Duration),
    {
        match self.record_failure(retryable) {
            RetryDecision::Retry { attempt, delay } => {
                warn!(
                    operation = label,
                    attempt,
                    max_attempts = self.policy.max_attempts(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %failure,
                    "operation failed; retrying after backoff"
                );
                on_retry(failure, attempt, delay);
                Some(delay)
            }
            RetryDecision::NotRetryable { attempt } => {
                debug!(
                    operation = label,
                    attempt,
                    error = %failure,
                    "operation failed with non-retryable error"
                );
                None
            }
            RetryDecision::Exhausted { attempts } => {
                error!(
                    operation = label,
                    attempts,
                    error = %failure,
                    "operation failed after exhausting retries"
                );
                None
            }
        }
    }
}

/// Cooperative suspension used between async attempts.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Thread-parking suspension used between blocking attempts.
pub trait BlockingSleeper: Send + Sync {
    /// Block the current thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// `std::thread::sleep` based sleeper.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl BlockingSleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

fn ignore_retry<E>(_: &E, _: u32, _: Duration) {}

/// Async retry executor.
///
/// # Examples
/// ```
/// use ebook_summary::domain::retry::{RetryExecutor, RetryPolicy};
/// use ebook_summary::domain::AppError;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let executor = RetryExecutor::new(RetryPolicy::default());
/// let value = executor
///     .run("ping", || async { Ok::<_, AppError>(42) })
///     .await
///     .expect("first attempt succeeds");
/// assert_eq!(value, 42);
/// # });
/// ```
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn RetrySleeper>,
}

impl RetryExecutor {
    /// Executor that waits with Tokio timers.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper, typically with a recording double in tests.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn RetrySleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Policy driving this executor.
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, retrying transient [`AppError`]s.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error unchanged once it is non-retryable or
    /// the attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, label: &str, operation: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        self.run_observed(label, operation, ignore_retry::<AppError>).await
    }

    /// Like [`RetryExecutor::run`], calling `on_retry(error, attempt, delay)`
    /// before each wait.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error unchanged.
    pub async fn run_observed<T, F, Fut, O>(
        &self,
        label: &str,
        operation: F,
        on_retry: O,
    ) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
        O: FnMut(&AppError, u32, Duration),
    {
        let policy = &self.policy;
        self.run_filtered(
            label,
            operation,
            |error: &AppError| policy.is_retryable(error),
            on_retry,
        )
        .await
    }

    /// Run an operation with a caller-supplied failure filter.
    ///
    /// Failures rejected by `is_retryable` propagate after a single attempt.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error unchanged.
    pub async fn run_filtered<T, E, F, Fut, C, O>(
        &self,
        label: &str,
        mut operation: F,
        is_retryable: C,
        mut on_retry: O,
    ) -> Result<T, E>
    where
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
        O: FnMut(&E, u32, Duration),
    {
        let mut schedule = RetrySchedule::new(&self.policy);
        loop {
            let failure = match operation().await {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };
            let retryable = is_retryable(&failure);
            match schedule.next_delay(label, &failure, retryable, &mut on_retry) {
                Some(delay) => self.sleeper.sleep(delay).await,
                None => return Err(failure),
            }
        }
    }
}

/// Blocking retry executor for synchronous callers.
#[derive(Clone)]
pub struct BlockingRetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn BlockingSleeper>,
}

impl BlockingRetryExecutor {
    /// Executor that parks the calling thread between attempts.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Replace the sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn BlockingSleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Policy driving this executor.
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, retrying transient [`AppError`]s.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error unchanged.
    pub fn run<T, F>(&self, label: &str, operation: F) -> Result<T, AppError>
    where
        F: FnMut() -> Result<T, AppError>,
    {
        self.run_observed(label, operation, ignore_retry::<AppError>)
    }

    /// Like [`BlockingRetryExecutor::run`] with a retry observer.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error unchanged.
    pub fn run_observed<T, F, O>(
        &self,
        label: &str,
        operation: F,
        on_retry: O,
    ) -> Result<T, AppError>
    where
        F: FnMut() -> Result<T, AppError>,
        O: FnMut(&AppError, u32, Duration),
    {
        let policy = &self.policy;
        self.run_filtered(
            label,
            operation,
            |error: &AppError| policy.is_retryable(error),
            on_retry,
        )
    }

    /// Run an operation with a caller-supplied failure filter.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error unchanged.
    pub fn run_filtered<T, E, F, C, O>(
        &self,
        label: &str,
        mut operation: F,
        is_retryable: C,
        mut on_retry: O,
    ) -> Result<T, E>
    where
        E: fmt::Display,
        F: FnMut() -> Result<T, E>,
        C: Fn(&E) -> bool,
        O: FnMut(&E, u32, Duration),
    {
        let mut schedule = RetrySchedule::new(&self.policy);
        loop {
            let failure = match operation() {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };
            let retryable = is_retryable(&failure);
            match schedule.next_delay(label, &failure, retryable, &mut on_retry) {
                Some(delay) => self.sleeper.sleep(delay),
                None => return Err(failure),
            }
        }
    }
}
