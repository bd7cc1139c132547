//! Health, model info and metrics payloads

use chrono::{DateTime, Utc};
use iris_core::logic::model::FeatureImportance;
use iris_core::{HealthStatus, MetricsSnapshot, ModelInfo, ModelSource};
use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub model_loaded: bool,
    pub version: &'static str,
}

impl From<HealthStatus> for HealthResponse {
    fn from(health: HealthStatus) -> Self {
        Self {
            status: health.status,
            timestamp: health.timestamp,
            model_loaded: health.model_loaded,
            version: VERSION,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelMetadata {
    pub source: ModelSource,
    pub artifact_id: String,
    pub trained_at: DateTime<Utc>,
    pub loaded_at: DateTime<Utc>,
    pub training_accuracy: f64,
    pub feature_importances: Vec<FeatureImportance>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub model_type: String,
    pub classes: Vec<String>,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub metadata: ModelMetadata,
}

impl From<ModelInfo> for ModelInfoResponse {
    fn from(info: ModelInfo) -> Self {
        Self {
            model_type: info.model_type,
            classes: info.classes,
            feature_count: info.feature_count,
            feature_names: info.feature_names,
            n_estimators: info.n_estimators,
            max_depth: info.max_depth,
            metadata: ModelMetadata {
                source: info.source,
                artifact_id: info.artifact_id.to_string(),
                trained_at: info.trained_at,
                loaded_at: info.loaded_at,
                training_accuracy: info.training_accuracy,
                feature_importances: info.feature_importances,
            },
        }
    }
}

/// Metrics snapshot plus server identity
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub snapshot: MetricsSnapshot,
    pub model_status: &'static str,
    pub version: &'static str,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(snapshot: MetricsSnapshot) -> Self {
        let model_status = if snapshot.model_loaded { "loaded" } else { "not_loaded" };
        Self {
            snapshot,
            model_status,
            version: VERSION,
        }
    }
}
