//! Shared test doubles for retry executor tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::retry::{BlockingSleeper, RetrySleeper};

/// Sleeper that returns immediately and remembers every requested delay.
///
/// Implements both the async and blocking sleeper ports so the two executors
/// can be compared against the same recording.
#[derive(Debug, Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    /// Delays requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Duration>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.lock().push(duration);
    }
}

impl BlockingSleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.lock().push(duration);
    }
}

/// Operation double that replays a fixed sequence of outcomes.
///
/// Once the script is exhausted the last scripted outcome repeats.
#[derive(Debug)]
pub struct ScriptedOperation<T, E> {
    outcomes: Mutex<VecDeque<Result<T, E>>>,
    fallback: Result<T, E>,
    calls: AtomicU32,
}

impl<T: Clone, E: Clone> ScriptedOperation<T, E> {
    /// Build from the outcomes of successive calls.
    ///
    /// # Panics
    ///
    /// Panics when `outcomes` is empty.
    pub fn new(outcomes: Vec<Result<T, E>>) -> Self {
        let Some(fallback) = outcomes.last().cloned() else {
            panic!("scripted operation needs at least one outcome");
        };
        Self {
            outcomes: Mutex::new(outcomes.into()),
            fallback,
            calls: AtomicU32::new(0),
        }
    }

    /// Produce the next outcome.
    pub fn call(&self) -> Result<T, E> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = match self.outcomes.lock() {
            Ok(mut outcomes) => outcomes.pop_front(),
            Err(_) => panic!("scripted operation mutex"),
        };
        next.unwrap_or_else(|| self.fallback.clone())
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}
