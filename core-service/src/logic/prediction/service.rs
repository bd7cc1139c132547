//! Prediction Service
//!
//! Owns the inference engine and the metrics collector for the process.
//! Every call to `predict` is recorded exactly once, success or failure.
//! Nothing is retried: validation and inference are deterministic.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;

use crate::logic::features::validate;
use crate::logic::metrics::{MetricsCollector, MetricsSnapshot};
use crate::logic::model::{
    argmax, ClassLabel, InferenceEngine, LoadedModel, ModelError, ModelInfo, ModelStore,
};
use super::types::{HealthStatus, PredictionError, PredictionResult, ProbabilityMap};

pub struct PredictionService<E: InferenceEngine = ModelStore> {
    engine: E,
    metrics: MetricsCollector,
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

impl<E: InferenceEngine> PredictionService<E> {
    pub fn new(engine: E) -> Self {
        let metrics = MetricsCollector::new();
        metrics.set_model_loaded(engine.is_loaded());
        Self { engine, metrics }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Validate, infer and shape one prediction
    pub fn predict(&self, payload: &Value) -> Result<PredictionResult, PredictionError> {
        let started = Instant::now();

        let features = match validate(payload) {
            Ok(features) => features,
            Err(e) => {
                log::warn!("Invalid request: {}", e);
                self.metrics.record_request(elapsed_ms(started), false);
                return Err(e.into());
            }
        };

        let probabilities = match self.engine.predict_proba(&features) {
            Ok(probabilities) => probabilities,
            Err(e) => {
                log::error!("Prediction error: {}", e);
                self.metrics.record_request(elapsed_ms(started), false);
                return Err(PredictionError::ModelUnavailable);
            }
        };

        let prediction = argmax(&probabilities);
        let class = ClassLabel::ALL[prediction];
        let confidence = probabilities[prediction];

        let result = PredictionResult {
            prediction,
            class,
            confidence,
            probabilities: ProbabilityMap::new(probabilities),
            timestamp: Utc::now(),
        };

        self.metrics.record_prediction(elapsed_ms(started), class);
        log::info!("Prediction made: class={}, confidence={:.4}", class, confidence);

        Ok(result)
    }

    /// Count a request that was rejected before it reached `predict`
    pub fn record_rejected(&self, started: Instant) {
        self.metrics.record_request(elapsed_ms(started), false);
    }

    pub fn model_info(&self) -> Result<ModelInfo, PredictionError> {
        self.engine.info().ok_or(PredictionError::ModelUnavailable)
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy",
            timestamp: Utc::now(),
            model_loaded: self.engine.is_loaded(),
        }
    }
}

impl PredictionService<ModelStore> {
    /// Drive the store to `Ready` and publish the result to metrics
    pub fn load_model(&self) -> Result<Arc<LoadedModel>, ModelError> {
        let result = self.engine.load();
        self.metrics.set_model_loaded(self.engine.is_loaded());
        result
    }
}
