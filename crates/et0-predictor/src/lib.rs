//! Hourly reference-evapotranspiration (ET0) prediction service.
//!
//! Every hour the scheduler averages the previous hour of weather-station
//! readings, feeds the averages to a pre-trained regression model and stores
//! the predicted ET0 next to the averages it was computed from.
//!
//! ```text
//! Scheduler ─▶ dedup ─▶ window ─▶ aggregate ─▶ predictor ─▶ store
//! ```

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod model;
pub mod pipeline;
pub mod predictor;
pub mod reading;
pub mod scheduler;
pub mod store;
pub mod window;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use model::{LinearRegressor, Regressor};
pub use pipeline::{CycleError, CycleOutcome, Pipeline};
pub use predictor::{FeatureRecord, Predictor};
pub use reading::{Prediction, Reading, Window, WindowAverage};
pub use store::{PredictionStore, SqliteStore, StoreError};
