//! Public result and error types of the prediction pipeline

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::logic::features::ValidationError;
use crate::logic::model::{ClassLabel, ClassProbabilities};

// ============================================================================
// RESULT
// ============================================================================

/// Class probabilities, serialized as `{label: p}` in class-index order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityMap(ClassProbabilities);

impl ProbabilityMap {
    pub fn new(probabilities: ClassProbabilities) -> Self {
        Self(probabilities)
    }

    pub fn as_array(&self) -> &ClassProbabilities {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassLabel, f64)> + '_ {
        ClassLabel::ALL.iter().copied().zip(self.0.iter().copied())
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl Serialize for ProbabilityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (class, p) in self.iter() {
            map.serialize_entry(class.as_str(), &p)?;
        }
        map.end()
    }
}

/// One served prediction; built per request and dropped after the response
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PredictionResult {
    /// Class index
    pub prediction: usize,
    pub class: ClassLabel,
    /// Probability of the predicted class
    pub confidence: f64,
    pub probabilities: ProbabilityMap,
    pub timestamp: DateTime<Utc>,
}

/// Liveness report
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub model_loaded: bool,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Model not available")]
    ModelUnavailable,
}

impl PredictionError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::Validation(e) => e.kind(),
            PredictionError::ModelUnavailable => "model_unavailable",
        }
    }

    /// Caller must fix the request (as opposed to a server-side condition)
    pub fn is_client_error(&self) -> bool {
        matches!(self, PredictionError::Validation(_))
    }
}
