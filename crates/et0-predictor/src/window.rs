//! Locate the hour of readings a cycle should predict from.
//!
//! The target is the most recently completed hour. If it holds no readings
//! the resolver looks exactly one hour further back and then gives up.

use crate::reading::{Reading, Window};
use crate::store::{bounded, PredictionStore, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A window together with the readings found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWindow {
    pub window: Window,
    pub readings: Vec<Reading>,
    /// Whether the primary window was empty and the previous hour was used.
    pub fallback: bool,
}

async fn read_window<S: PredictionStore + ?Sized>(
    store: &S,
    window: Window,
    limit: Duration,
) -> Result<Vec<Reading>> {
    bounded("read_recent", limit, store.read_recent(window.start, window.end)).await
}

/// Resolve the window for `now`.
///
/// Returns `Ok(None)` when both the last completed hour and the hour before
/// it are empty. Storage errors are propagated.
pub async fn resolve<S: PredictionStore + ?Sized>(
    store: &S,
    now: DateTime<Utc>,
    limit: Duration,
) -> Result<Option<ResolvedWindow>> {
    let primary = Window::last_completed(now);
    let readings = read_window(store, primary, limit).await?;
    if !readings.is_empty() {
        log::debug!(
            "[Window] {} readings in [{}, {}]",
            readings.len(),
            primary.start,
            primary.end
        );
        return Ok(Some(ResolvedWindow {
            window: primary,
            readings,
            fallback: false,
        }));
    }

    let fallback = primary.previous();
    log::info!(
        "[Window] no readings in [{}, {}], trying [{}, {}]",
        primary.start,
        primary.end,
        fallback.start,
        fallback.end
    );
    let readings = read_window(store, fallback, limit).await?;
    if readings.is_empty() {
        return Ok(None);
    }

    Ok(Some(ResolvedWindow {
        window: fallback,
        readings,
        fallback: true,
    }))
}
