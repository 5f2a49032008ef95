//! ET0 inference behind a fixed, named feature contract.
//!
//! Callers hand over a [`FeatureRecord`] with named fields. The predictor
//! alone decides the positional order sent to the model, so temperature,
//! humidity and solar radiation can never be swapped by accident.

use crate::model::{ModelError, Regressor, FEATURE_ORDER};
use crate::reading::WindowAverage;
use std::fmt;
use std::sync::Arc;

/// One model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Temperature,
    SolarRadiation,
    Humidity,
}

impl Feature {
    /// Model input order.
    pub const ORDER: [Feature; 3] = [
        Feature::Temperature,
        Feature::SolarRadiation,
        Feature::Humidity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::Temperature => "temperature",
            Feature::SolarRadiation => "solar_radiation",
            Feature::Humidity => "humidity",
        }
    }

    /// Accepted range for an hourly mean of this feature.
    fn range(&self) -> (f64, f64) {
        match self {
            Feature::Temperature => (-90.0, 60.0),
            Feature::SolarRadiation => (0.0, f64::MAX),
            Feature::Humidity => (0.0, 100.0),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while preparing or running inference.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PredictError {
    #[error("No {0} values available in the window")]
    MissingFeature(Feature),
    #[error("{feature} = {value} is outside the accepted range")]
    InvalidFeature { feature: Feature, value: f64 },
    #[error("Model returned a non-finite value: {0}")]
    NonFinite(f64),
}

/// Labeled model input: °C, %, W/m².
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRecord {
    pub temperature: f64,
    pub humidity: f64,
    pub solar_radiation: f64,
}

impl FeatureRecord {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Temperature => self.temperature,
            Feature::SolarRadiation => self.solar_radiation,
            Feature::Humidity => self.humidity,
        }
    }
}

impl TryFrom<&WindowAverage> for FeatureRecord {
    type Error = PredictError;

    fn try_from(avg: &WindowAverage) -> Result<Self, Self::Error> {
        Ok(Self {
            temperature: avg
                .avg_temperature
                .ok_or(PredictError::MissingFeature(Feature::Temperature))?,
            humidity: avg
                .avg_humidity
                .ok_or(PredictError::MissingFeature(Feature::Humidity))?,
            solar_radiation: avg
                .avg_solar_radiation
                .ok_or(PredictError::MissingFeature(Feature::SolarRadiation))?,
        })
    }
}

/// Wraps the loaded model.
#[derive(Clone)]
pub struct Predictor {
    model: Arc<dyn Regressor>,
}

impl Predictor {
    /// Wrap a loaded model, rejecting it if its inputs are not
    /// `[temperature, solar_radiation, humidity]`.
    pub fn new(model: Arc<dyn Regressor>) -> Result<Self, ModelError> {
        let found = model.feature_names();
        if found.iter().map(String::as_str).ne(FEATURE_ORDER) {
            return Err(ModelError::FeatureContract {
                expected: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
                found,
            });
        }
        Ok(Self { model })
    }

    /// Predict ET0 (mm/day) for one window's averages.
    pub fn predict(&self, record: &FeatureRecord) -> Result<f64, PredictError> {
        let mut inputs = [0.0; 3];
        for (slot, feature) in inputs.iter_mut().zip(Feature::ORDER) {
            let value = record.get(feature);
            let (lo, hi) = feature.range();
            if !value.is_finite() || value < lo || value > hi {
                return Err(PredictError::InvalidFeature { feature, value });
            }
            *slot = value;
        }

        let et0 = self.model.predict(&inputs);
        if !et0.is_finite() {
            return Err(PredictError::NonFinite(et0));
        }
        log::debug!("[Predictor] inputs {:?} -> et0 {:.4}", inputs, et0);
        Ok(et0)
    }
}

impl fmt::Debug for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predictor")
            .field("features", &self.model.feature_names())
            .finish()
    }
}
