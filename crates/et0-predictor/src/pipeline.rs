//! One prediction cycle: guard, resolve, average, predict, persist.

use crate::aggregate;
use crate::dedup;
use crate::predictor::{FeatureRecord, PredictError, Predictor};
use crate::reading::{Prediction, Window};
use crate::store::{bounded, PredictionStore, StoreError};
use crate::window;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// How a cycle ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A prediction already covers the window; nothing was written.
    AlreadyPredicted { window_start: DateTime<Utc> },
    /// Neither the target hour nor its fallback had readings.
    NoData { window_start: DateTime<Utc> },
    /// A new prediction row was written.
    Stored(Prediction),
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::AlreadyPredicted { window_start } => {
                write!(f, "window {} already predicted", window_start)
            }
            CycleOutcome::NoData { window_start } => {
                write!(f, "no readings for window {} or the hour before", window_start)
            }
            CycleOutcome::Stored(p) => write!(
                f,
                "stored et0={:.4} for window {} (temp={:.2} humidity={:.2} solar={:.2})",
                p.et0, p.window_start, p.avg_temperature, p.avg_humidity, p.avg_solar_radiation
            ),
        }
    }
}

/// Errors that abort a cycle. None of them are fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Inference failed for window {window_start}: {source}")]
    Predict {
        window_start: DateTime<Utc>,
        #[source]
        source: PredictError,
    },
}

/// The components a cycle runs through.
pub struct Pipeline<S> {
    store: S,
    predictor: Predictor,
    op_timeout: Duration,
}

impl<S: PredictionStore> Pipeline<S> {
    /// `op_timeout` bounds every individual storage call.
    pub fn new(store: S, predictor: Predictor, op_timeout: Duration) -> Self {
        Self {
            store,
            predictor,
            op_timeout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one cycle as of `now`.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleOutcome, CycleError> {
        let target = Window::last_completed(now);

        let last = dedup::last_prediction_or_fail_open(&self.store, self.op_timeout).await;
        if !dedup::check(last, now) {
            return Ok(CycleOutcome::AlreadyPredicted {
                window_start: target.start,
            });
        }

        let Some(resolved) = window::resolve(&self.store, now, self.op_timeout).await? else {
            return Ok(CycleOutcome::NoData {
                window_start: target.start,
            });
        };
        let window_start = resolved.window.start;
        if resolved.fallback {
            log::info!("[Pipeline] using fallback window {}", window_start);
        }

        // A fallback hour may have been filled by an earlier cycle.
        if last.is_some_and(|last| last >= window_start) {
            return Ok(CycleOutcome::AlreadyPredicted { window_start });
        }

        let Some(average) = aggregate::average(resolved.window, &resolved.readings) else {
            return Ok(CycleOutcome::NoData { window_start });
        };

        let predict_err = |source| CycleError::Predict {
            window_start,
            source,
        };
        let record = FeatureRecord::try_from(&average).map_err(predict_err)?;
        let et0 = self.predictor.predict(&record).map_err(predict_err)?;

        let prediction = Prediction {
            window_start,
            avg_temperature: record.temperature,
            avg_humidity: record.humidity,
            avg_solar_radiation: record.solar_radiation,
            et0,
        };
        bounded(
            "write_prediction",
            self.op_timeout,
            self.store.write_prediction(&prediction),
        )
        .await?;

        Ok(CycleOutcome::Stored(prediction))
    }
}
