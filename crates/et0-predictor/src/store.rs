//! SQLite persistence for sensor readings and ET0 predictions.
//!
//! Readings are written by upstream ingestion; this crate only reads them.
//! Predictions are written exclusively by the pipeline. The `predictions`
//! table has no uniqueness constraint on the window start, so duplicate
//! protection is entirely up to [`crate::dedup`].
//!
//! Every operation opens its own connection on the blocking thread pool and
//! drops it before returning. No connection outlives a single call.

use crate::reading::{Prediction, Reading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    #[error("Invalid epoch timestamp in store: {0}")]
    InvalidTimestamp(i64),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Read/write access to the readings and predictions tables.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Readings with `start <= timestamp <= end`, ascending by timestamp.
    async fn read_recent(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Reading>>;

    /// Window start of the newest stored prediction, if any.
    async fn read_last_prediction_timestamp(&self) -> Result<Option<DateTime<Utc>>>;

    async fn write_prediction(&self, prediction: &Prediction) -> Result<()>;
}

/// Run a storage future with an upper bound on its duration.
///
/// A blocking SQLite call keeps running on its worker thread after the
/// deadline, but the caller is released and gets [`StoreError::Timeout`].
pub async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation,
            after: limit,
        }),
    }
}

fn from_epoch(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(StoreError::InvalidTimestamp(secs))
}

type RawReading = (i64, Option<f64>, Option<f64>, Option<f64>);
type RawPrediction = (i64, f64, f64, f64, f64);

/// SQLite-backed store addressed by file path.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    ///
    /// Creates the parent directory and both tables if they don't exist and
    /// switches the file to WAL journal mode. The connection used for setup
    /// is closed before returning.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS readings (
                timestamp        INTEGER NOT NULL,
                temperature      REAL,
                humidity         REAL,
                solar_radiation  REAL
            );
            CREATE INDEX IF NOT EXISTS idx_readings_ts ON readings(timestamp);

            CREATE TABLE IF NOT EXISTS predictions (
                id                   INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp            INTEGER NOT NULL,
                avg_temp             REAL NOT NULL,
                avg_humidity         REAL NOT NULL,
                avg_solar_radiation  REAL NOT NULL,
                predicted_et0        REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_predictions_ts ON predictions(timestamp);",
        )?;

        log::debug!("[Store] schema ready at {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against a fresh connection on the blocking pool.
    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path)?;
            conn.busy_timeout(Duration::from_secs(5))?;
            f(&conn)
        })
        .await?
    }

    /// Insert a sensor reading. Used by ingestion tooling and tests.
    pub async fn insert_reading(&self, reading: &Reading) -> Result<()> {
        let reading = reading.clone();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO readings (timestamp, temperature, humidity, solar_radiation) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    reading.timestamp.timestamp(),
                    reading.temperature,
                    reading.humidity,
                    reading.solar_radiation,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// All predictions stored for the window starting at `window_start`.
    pub async fn predictions_for_window(
        &self,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<Prediction>> {
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT timestamp, avg_temp, avg_humidity, avg_solar_radiation, predicted_et0 \
                 FROM predictions WHERE timestamp = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(
                params![window_start.timestamp()],
                |row| -> rusqlite::Result<RawPrediction> {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                },
            )?;

            let mut predictions = Vec::new();
            for row in rows {
                let (ts, avg_temperature, avg_humidity, avg_solar_radiation, et0) = row?;
                predictions.push(Prediction {
                    window_start: from_epoch(ts)?,
                    avg_temperature,
                    avg_humidity,
                    avg_solar_radiation,
                    et0,
                });
            }
            Ok(predictions)
        })
        .await
    }
}

#[async_trait]
impl PredictionStore for SqliteStore {
    async fn read_recent(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Reading>> {
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT timestamp, temperature, humidity, solar_radiation \
                 FROM readings WHERE timestamp >= ?1 AND timestamp <= ?2 \
                 ORDER BY timestamp ASC",
            )?;
            let rows = stmt.query_map(
                params![start.timestamp(), end.timestamp()],
                |row| -> rusqlite::Result<RawReading> {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                },
            )?;

            let mut readings = Vec::new();
            for row in rows {
                let (ts, temperature, humidity, solar_radiation) = row?;
                readings.push(Reading {
                    timestamp: from_epoch(ts)?,
                    temperature,
                    humidity,
                    solar_radiation,
                });
            }
            Ok(readings)
        })
        .await
    }

    async fn read_last_prediction_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        self.with_connection(|conn| {
            let last: Option<i64> =
                conn.query_row("SELECT MAX(timestamp) FROM predictions", [], |row| row.get(0))?;
            last.map(from_epoch).transpose()
        })
        .await
    }

    async fn write_prediction(&self, prediction: &Prediction) -> Result<()> {
        let prediction = prediction.clone();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO predictions \
                 (timestamp, avg_temp, avg_humidity, avg_solar_radiation, predicted_et0) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    prediction.window_start.timestamp(),
                    prediction.avg_temperature,
                    prediction.avg_humidity,
                    prediction.avg_solar_radiation,
                    prediction.et0,
                ],
            )?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    /// Helper: create an in-tempdir store.
    /// Returns (SqliteStore, TempDir) so the tempdir stays alive.
    fn test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("station.db")).unwrap();
        (store, dir)
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, h, m, s).unwrap()
    }

    fn prediction(window_start: DateTime<Utc>, et0: f64) -> Prediction {
        Prediction {
            window_start,
            avg_temperature: 22.5,
            avg_humidity: 40.0,
            avg_solar_radiation: 300.0,
            et0,
        }
    }

    #[test]
    fn open_twice_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("station.db");
        SqliteStore::open(&db_path).unwrap();
        SqliteStore::open(&db_path).unwrap();
    }

    #[test]
    fn open_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("deeper").join("station.db");
        SqliteStore::open(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn read_recent_is_inclusive_and_ascending() {
        let (store, _dir) = test_store();
        for ts in [at(9, 30, 0), at(8, 59, 59), at(9, 59, 59), at(9, 0, 0), at(10, 0, 0)] {
            store
                .insert_reading(&Reading::complete(ts, 20.0, 50.0, 100.0))
                .await
                .unwrap();
        }

        let rows = store.read_recent(at(9, 0, 0), at(9, 59, 59)).await.unwrap();
        let stamps: Vec<_> = rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![at(9, 0, 0), at(9, 30, 0), at(9, 59, 59)]);
    }

    #[tokio::test]
    async fn missing_sensor_values_read_back_as_none() {
        let (store, _dir) = test_store();
        let reading = Reading {
            timestamp: at(9, 15, 0),
            temperature: Some(18.0),
            humidity: None,
            solar_radiation: Some(250.0),
        };
        store.insert_reading(&reading).await.unwrap();

        let rows = store.read_recent(at(9, 0, 0), at(9, 59, 59)).await.unwrap();
        assert_eq!(rows, vec![reading]);
    }

    #[tokio::test]
    async fn last_prediction_timestamp_empty_then_max() {
        let (store, _dir) = test_store();
        assert_eq!(store.read_last_prediction_timestamp().await.unwrap(), None);

        store.write_prediction(&prediction(at(9, 0, 0), 0.4)).await.unwrap();
        store.write_prediction(&prediction(at(7, 0, 0), 0.2)).await.unwrap();

        assert_eq!(
            store.read_last_prediction_timestamp().await.unwrap(),
            Some(at(9, 0, 0))
        );
    }

    #[tokio::test]
    async fn duplicate_windows_are_not_rejected() {
        let (store, _dir) = test_store();
        store.write_prediction(&prediction(at(9, 0, 0), 0.4)).await.unwrap();
        store.write_prediction(&prediction(at(9, 0, 0), 0.5)).await.unwrap();

        let stored = store.predictions_for_window(at(9, 0, 0)).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].et0, 0.4);
        assert_eq!(stored[1].et0, 0.5);
    }

    #[tokio::test]
    async fn bounded_times_out_slow_operations() {
        let result: Result<()> = bounded("slow_read", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        match result {
            Err(StoreError::Timeout { operation, .. }) => assert_eq!(operation, "slow_read"),
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bounded_passes_through_results() {
        let value = bounded("fast", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
