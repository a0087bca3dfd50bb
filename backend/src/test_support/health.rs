//! Shared test doubles for health reporting.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::Clock;

use crate::domain::ports::{DatabaseProbe, GenerativeApiProbe, GenerativeApiStatus};
use crate::domain::{AppError, ErrorKind};

/// Clock pinned to a single instant until moved with [`FixedClock::set`].
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Database probe with a canned answer.
#[derive(Debug, Clone)]
pub struct StubDatabaseProbe {
    reachable: bool,
}

impl StubDatabaseProbe {
    pub const fn reachable() -> Self {
        Self { reachable: true }
    }

    pub const fn unreachable() -> Self {
        Self { reachable: false }
    }
}

#[async_trait]
impl DatabaseProbe for StubDatabaseProbe {
    async fn ping(&self) -> Result<(), AppError> {
        if self.reachable {
            Ok(())
        } else {
            Err(AppError::new(ErrorKind::DbConnectionError, "connection refused")
                .with_retryable(true))
        }
    }
}

/// Generative API probe with a canned answer.
#[derive(Debug, Clone, Copy)]
pub struct StubGenerativeApiProbe(pub GenerativeApiStatus);

#[async_trait]
impl GenerativeApiProbe for StubGenerativeApiProbe {
    async fn status(&self) -> GenerativeApiStatus {
        self.0
    }
}
