//! Best-effort guard against predicting the same window twice.
//!
//! The check compares the newest stored prediction with the most recently
//! completed hour. It is race-prone by nature: two processes running the
//! pipeline at the same moment can both pass it, and the store does not
//! enforce uniqueness.

use crate::reading::floor_hour;
use crate::store::{bounded, PredictionStore};
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Whether the pipeline should run for `now`.
///
/// Returns `false` when a prediction already exists for the most recently
/// completed hour (or anything later).
pub fn check(last_prediction: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_prediction {
        Some(last) => floor_hour(last) < floor_hour(now) - TimeDelta::hours(1),
        None => true,
    }
}

/// Read the newest prediction timestamp, failing open.
///
/// A storage failure is logged and reported as "no prediction yet", so the
/// pipeline keeps running instead of stalling on an unreadable store.
pub async fn last_prediction_or_fail_open<S: PredictionStore + ?Sized>(
    store: &S,
    limit: Duration,
) -> Option<DateTime<Utc>> {
    match bounded(
        "read_last_prediction_timestamp",
        limit,
        store.read_last_prediction_timestamp(),
    )
    .await
    {
        Ok(last) => last,
        Err(e) => {
            log::warn!(
                "[Dedup] could not read last prediction ({}), proceeding without dedup",
                e
            );
            None
        }
    }
}
