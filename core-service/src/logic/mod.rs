//! Logic Module - prediction pipeline components
//!
//! - `features/` - input schema, `FeatureVector`, request validation
//! - `model/` - Iris dataset, random forest, artifact storage, `ModelStore`
//! - `metrics/` - `MetricsCollector`
//! - `prediction/` - `PredictionService`

pub mod features;
pub mod model;
pub mod metrics;
pub mod prediction;
