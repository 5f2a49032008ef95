//! Test helpers shared by the integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use et0_predictor::{Clock, LinearRegressor, Predictor, Reading, SqliteStore};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const MODEL_JSON: &str = r#"{
    "features": ["temperature", "solar_radiation", "humidity"],
    "coefficients": [0.02, 0.001, -0.004],
    "intercept": 0.1
}"#;

/// 2024-06-15 at the given UTC time.
pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, h, m, s).unwrap()
}

/// Fresh database in a tempdir. Keep the TempDir alive for the test.
pub fn temp_store() -> (SqliteStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("station.db")).unwrap();
    (store, dir)
}

pub async fn seed(store: &SqliteStore, rows: &[Reading]) {
    for r in rows {
        store.insert_reading(r).await.unwrap();
    }
}

pub fn predictor() -> Predictor {
    Predictor::new(Arc::new(LinearRegressor::parse(MODEL_JSON).unwrap())).unwrap()
}

/// Same formula as `MODEL_JSON`.
pub fn expected_et0(temperature: f64, humidity: f64, solar_radiation: f64) -> f64 {
    0.1 + 0.02 * temperature + 0.001 * solar_radiation - 0.004 * humidity
}

/// Clock that hands out a scripted sequence of instants, then repeats the
/// last one forever.
pub struct ScriptedClock {
    instants: Mutex<VecDeque<DateTime<Utc>>>,
}

impl ScriptedClock {
    pub fn new(instants: impl IntoIterator<Item = DateTime<Utc>>) -> Self {
        let instants: VecDeque<_> = instants.into_iter().collect();
        assert!(!instants.is_empty(), "ScriptedClock needs at least one instant");
        Self {
            instants: Mutex::new(instants),
        }
    }

    pub fn fixed(instant: DateTime<Utc>) -> Self {
        Self::new([instant])
    }
}

impl Clock for ScriptedClock {
    fn now(&self) -> DateTime<Utc> {
        let mut instants = self.instants.lock().unwrap();
        if instants.len() > 1 {
            instants.pop_front().unwrap()
        } else {
            instants[0]
        }
    }
}
