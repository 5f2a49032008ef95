//! Pre-trained regression artifact.
//!
//! The model is loaded once at startup and shared read-only for the life of
//! the process. Its parameters are opaque to the rest of the crate: callers
//! only see the [`Regressor`] trait.

use serde::Deserialize;
use std::path::Path;

/// Feature names, in the exact order the model was trained on.
pub const FEATURE_ORDER: [&str; 3] = ["temperature", "solar_radiation", "humidity"];

/// Errors from loading a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model artifact '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Model features {found:?} do not match the expected order {expected:?}")]
    FeatureContract {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Model has {coefficients} coefficients for {features} features")]
    Shape { features: usize, coefficients: usize },
}

/// A regression model mapping an ordered feature vector to a scalar.
pub trait Regressor: Send + Sync {
    /// Feature names the model expects, in input order.
    fn feature_names(&self) -> Vec<String>;

    /// Evaluate the model. `features` follows [`Regressor::feature_names`].
    fn predict(&self, features: &[f64]) -> f64;
}

/// Ordinary linear regression: `intercept + Σ coefficient·feature`.
///
/// Stored on disk as JSON:
///
/// ```json
/// {
///   "features": ["temperature", "solar_radiation", "humidity"],
///   "coefficients": [0.021, 0.0012, -0.0035],
///   "intercept": 0.05
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LinearRegressor {
    features: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(
        features: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, ModelError> {
        let model = Self {
            features,
            coefficients,
            intercept,
        };
        model.validate()?;
        Ok(model)
    }

    /// Load a JSON artifact from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse a JSON artifact.
    pub fn parse(json: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.features.iter().map(String::as_str).ne(FEATURE_ORDER) {
            return Err(ModelError::FeatureContract {
                expected: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
                found: self.features.clone(),
            });
        }
        if self.coefficients.len() != self.features.len() {
            return Err(ModelError::Shape {
                features: self.features.len(),
                coefficients: self.coefficients.len(),
            });
        }
        Ok(())
    }
}

impl Regressor for LinearRegressor {
    fn feature_names(&self) -> Vec<String> {
        self.features.clone()
    }

    fn predict(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (c, x)| acc + c * x)
    }
}
