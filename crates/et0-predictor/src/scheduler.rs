//! Hourly driver for the prediction pipeline.
//!
//! Runs one cycle immediately, then sleeps until a fixed offset past the
//! next hour boundary and repeats. The wait is recomputed from the clock
//! after every cycle, so slow cycles never accumulate drift. A failed cycle
//! is logged and the loop carries on; only the shutdown signal stops it.

use crate::clock::Clock;
use crate::pipeline::{CycleOutcome, Pipeline};
use crate::reading::floor_hour;
use crate::store::PredictionStore;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tokio::sync::watch;

/// Next wake-up: the hour boundary after `now`, plus `offset`.
pub fn next_wake(now: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
    let offset = TimeDelta::from_std(offset).unwrap_or(TimeDelta::zero());
    floor_hour(now) + TimeDelta::hours(1) + offset
}

/// How long to sleep from `now` until `wake`. Zero if `wake` has passed.
fn wait_until(now: DateTime<Utc>, wake: DateTime<Utc>) -> Duration {
    (wake - now).to_std().unwrap_or_default()
}

/// Run one cycle and log its result. Never propagates an error.
pub async fn tick<S: PredictionStore, C: Clock>(pipeline: &Pipeline<S>, clock: &C) {
    let now = clock.now();
    log::info!("[Scheduler] cycle started at {}", now);
    match pipeline.run_cycle(now).await {
        Ok(outcome @ CycleOutcome::NoData { .. }) => log::warn!("[Scheduler] {}", outcome),
        Ok(outcome) => log::info!("[Scheduler] {}", outcome),
        Err(e) => log::error!("[Scheduler] cycle failed: {}", e),
    }
}

/// Run the scheduler loop until the shutdown signal fires.
pub async fn run_scheduler<S: PredictionStore, C: Clock>(
    pipeline: &Pipeline<S>,
    clock: &C,
    wake_offset: Duration,
    mut shutdown: watch::Receiver<()>,
) {
    log::info!(
        "[Scheduler] starting hourly loop (wake offset {}s)",
        wake_offset.as_secs()
    );

    loop {
        tick(pipeline, clock).await;

        let now = clock.now();
        let wake = next_wake(now, wake_offset);
        log::info!("[Scheduler] next cycle at {}", wake);

        tokio::select! {
            _ = tokio::time::sleep(wait_until(now, wake)) => {}
            _ = shutdown.changed() => {
                log::info!("[Scheduler] shutdown signal received, exiting");
                break;
            }
        }
    }
}
