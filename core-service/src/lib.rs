//! Iris Core - prediction-serving core for the Iris classifier
//!
//! ```text
//! payload ──► validate ──► ModelStore (scaler + random forest) ──► PredictionResult
//!                │                         │                              │
//!                └──────── MetricsCollector ◄──────────────────────────────┘
//! ```
//!
//! - [`logic::features`] - input schema and request validation
//! - [`logic::model`] - training, artifact persistence, `ModelStore`
//! - [`logic::metrics`] - process-wide request counters
//! - [`logic::prediction`] - `PredictionService`, the request pipeline

pub mod constants;
pub mod logic;

pub use logic::features::{FeatureVector, ValidationError};
pub use logic::metrics::{MetricsCollector, MetricsSnapshot};
pub use logic::model::{
    ClassLabel, InferenceEngine, ModelArtifact, ModelError, ModelInfo, ModelSource, ModelStore,
    ModelStoreConfig, TrainingConfig,
};
pub use logic::prediction::{HealthStatus, PredictionError, PredictionResult, PredictionService};
