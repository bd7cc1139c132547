//! Prediction Module - end-to-end request pipeline
//!
//! validate → infer → shape → record metrics

pub mod types;
pub mod service;


pub use types::{HealthStatus, PredictionError, PredictionResult, ProbabilityMap};
pub use service::PredictionService;
