//! Data model shared by every stage of the pipeline.

use chrono::{DateTime, TimeDelta, Utc};

const SECS_PER_HOUR: i64 = 3600;

/// Truncate a timestamp to the start of its UTC hour.
///
/// Minutes, seconds and sub-second precision are zeroed.
pub fn floor_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    let into_hour = t.timestamp().rem_euclid(SECS_PER_HOUR);
    t - TimeDelta::seconds(into_hour) - TimeDelta::nanoseconds(t.timestamp_subsec_nanos() as i64)
}

/// One row of the `readings` table, written by upstream ingestion.
///
/// A sensor column is `None` when the station did not report it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub solar_radiation: Option<f64>,
}

impl Reading {
    /// A reading with every sensor column present.
    pub fn complete(
        timestamp: DateTime<Utc>,
        temperature: f64,
        humidity: f64,
        solar_radiation: f64,
    ) -> Self {
        Self {
            timestamp,
            temperature: Some(temperature),
            humidity: Some(humidity),
            solar_radiation: Some(solar_radiation),
        }
    }
}

/// A one-hour window aligned to an hour boundary.
///
/// `end` is inclusive and sits one second before the next boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// The window of the hour that contains `t`.
    pub fn containing(t: DateTime<Utc>) -> Self {
        let start = floor_hour(t);
        Self {
            start,
            end: start + TimeDelta::seconds(SECS_PER_HOUR - 1),
        }
    }

    /// The most recently completed hour relative to `now`.
    pub fn last_completed(now: DateTime<Utc>) -> Self {
        Self::containing(floor_hour(now) - TimeDelta::hours(1))
    }

    /// The hour immediately before this one.
    pub fn previous(&self) -> Self {
        Self::containing(self.start - TimeDelta::hours(1))
    }
}

/// Per-column means over a window, recomputed every cycle.
///
/// A column is `None` when no reading in the window carried a value for it.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAverage {
    pub window: Window,
    pub avg_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_solar_radiation: Option<f64>,
    pub samples: usize,
}

/// One row of the `predictions` table, keyed logically by `window_start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub window_start: DateTime<Utc>,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_solar_radiation: f64,
    pub et0: f64,
}
