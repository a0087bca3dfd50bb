//! Behaviour tests for the retry executor's backoff schedule.
//!
//! Scenarios run the blocking executor with a recording sleeper so delays are
//! observed without waiting.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use ebook_summary::domain::retry::{BlockingRetryExecutor, RetryPolicy};
use ebook_summary::domain::{AppError, ErrorKind};
use ebook_summary::test_support::retry::{RecordingSleeper, ScriptedOperation};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

struct RetryWorld {
    policy: RefCell<Option<RetryPolicy>>,
    operation: RefCell<Option<ScriptedOperation<&'static str, AppError>>>,
    sleeper: Arc<RecordingSleeper>,
    observed_attempts: RefCell<Vec<u32>>,
    outcome: RefCell<Option<Result<&'static str, AppError>>>,
}

impl RetryWorld {
    fn new() -> Self {
        Self {
            policy: RefCell::new(None),
            operation: RefCell::new(None),
            sleeper: Arc::new(RecordingSleeper::default()),
            observed_attempts: RefCell::new(Vec::new()),
            outcome: RefCell::new(None),
        }
    }

    fn script(&self, outcomes: Vec<Result<&'static str, AppError>>) {
        *self.operation.borrow_mut() = Some(ScriptedOperation::new(outcomes));
    }

    fn calls(&self) -> u32 {
        self.operation
            .borrow()
            .as_ref()
            .expect("operation scripted")
            .calls()
    }

    fn with_error<F>(&self, f: F)
    where
        F: FnOnce(&AppError),
    {
        match self.outcome.borrow().as_ref().expect("operation ran") {
            Ok(value) => panic!("expected failure, got {value:?}"),
            Err(error) => f(error),
        }
    }
}

fn parse_seconds(list: &str) -> Vec<Duration> {
    list.split(',')
        .map(|item| Duration::from_secs(item.trim().parse().expect("whole seconds")))
        .collect()
}

#[fixture]
fn world() -> RetryWorld {
    RetryWorld::new()
}

#[given("a retry policy allowing {retries} retries from {initial} second doubling up to {cap} seconds")]
fn a_retry_policy(world: &RetryWorld, retries: u32, initial: u64, cap: u64) {
    let policy = RetryPolicy::builder()
        .max_retries(retries)
        .initial_delay(Duration::from_secs(initial))
        .max_delay(Duration::from_secs(cap))
        .exponential_base(2.0)
        .build()
        .expect("valid policy");
    *world.policy.borrow_mut() = Some(policy);
}

#[given("an operation that is rate limited {failures} times before succeeding")]
fn rate_limited_then_succeeds(world: &RetryWorld, failures: usize) {
    let mut outcomes: Vec<Result<&'static str, AppError>> = (0..failures)
        .map(|_| Err(AppError::new(ErrorKind::RateLimited, "Rate limit exceeded")))
        .collect();
    outcomes.push(Ok("summary"));
    world.script(outcomes);
}

#[given("an operation that always fails with an invalid PDF")]
fn always_invalid_pdf(world: &RetryWorld) {
    world.script(vec![Err(AppError::new(
        ErrorKind::InvalidPdf,
        "File is not a valid PDF",
    )
    .with_retryable(false))]);
}

#[given("an operation that always times out")]
fn always_times_out(world: &RetryWorld) {
    world.script(vec![Err(AppError::new(ErrorKind::Timeout, "upstream timed out"))]);
}

#[when("the operation runs under the retry executor")]
fn run_operation(world: &RetryWorld) {
    let policy = world.policy.borrow_mut().take().expect("policy configured");
    let executor = BlockingRetryExecutor::new(policy).with_sleeper(world.sleeper.clone());
    let operation = world.operation.borrow();
    let operation = operation.as_ref().expect("operation scripted");
    let outcome = executor.run_observed(
        "generate_summary",
        || operation.call(),
        |_: &AppError, attempt: u32, _: Duration| {
            world.observed_attempts.borrow_mut().push(attempt);
        },
    );
    *world.outcome.borrow_mut() = Some(outcome);
}

#[then("the operation succeeds")]
fn the_operation_succeeds(world: &RetryWorld) {
    let outcome = world.outcome.borrow();
    assert_eq!(
        outcome.as_ref().expect("operation ran").as_ref().ok(),
        Some(&"summary")
    );
}

#[then("the operation fails with {code}")]
fn the_operation_fails_with(world: &RetryWorld, code: String) {
    world.with_error(|error| {
        assert_eq!(error.kind(), ErrorKind::from_code(&code));
        assert_eq!(error.kind().as_str(), code);
    });
}

#[then("the operation was attempted {count} times")]
fn attempted_times(world: &RetryWorld, count: u32) {
    assert_eq!(world.calls(), count);
}

#[then("the executor waited {delays} seconds")]
fn the_executor_waited(world: &RetryWorld, delays: String) {
    assert_eq!(world.sleeper.recorded(), parse_seconds(&delays));
}

#[then("the executor never waited")]
fn the_executor_never_waited(world: &RetryWorld) {
    assert!(world.sleeper.recorded().is_empty());
}

#[then("the retry observer saw attempts {attempts}")]
fn the_observer_saw(world: &RetryWorld, attempts: String) {
    let expected: Vec<u32> = attempts
        .split(',')
        .map(|item| item.trim().parse().expect("attempt number"))
        .collect();
    assert_eq!(*world.observed_attempts.borrow(), expected);
}

#[scenario(
    path = "tests/features/retry_backoff.feature",
    name = "A rate-limited call recovers on the fourth attempt"
)]
fn rate_limited_call_recovers(world: RetryWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/retry_backoff.feature",
    name = "A non-retryable failure is raised after one attempt"
)]
fn non_retryable_failure_is_raised(world: RetryWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/retry_backoff.feature",
    name = "Delays stop growing at the cap"
)]
fn delays_stop_growing_at_the_cap(world: RetryWorld) {
    drop(world);
}
