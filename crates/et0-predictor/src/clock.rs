//! Wall-clock source for the scheduler and the pipeline.

use chrono::{DateTime, Utc};

/// Provides the current instant.
///
/// Window resolution and deduplication only ever see time through this
/// trait, so tests can pin "now" without waiting on the real clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
