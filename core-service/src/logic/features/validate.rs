//! Request Validator
//!
//! Decode-then-validate for prediction payloads. Untyped JSON stops here;
//! everything downstream works with a `FeatureVector`.
//!
//! Rules are checked in order and the first failure wins:
//! 1. `features` present and not null
//! 2. `features` is an array of JSON numbers
//! 3. exactly `FEATURE_COUNT` entries
//! 4. every value finite

use serde_json::Value;

use super::layout::FEATURE_COUNT;
use super::vector::{FeatureVector, FeatureVectorError};

/// Name of the payload field holding the feature array
pub const FEATURES_FIELD: &str = "features";

/// Client-side request errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing features in request")]
    MissingFeatures,

    #[error("Features must be an array of numbers{}", .index.map(|i| format!(" (invalid entry at index {i})")).unwrap_or_default())]
    InvalidType { index: Option<usize> },

    #[error("Expected {expected} features, got {actual}")]
    WrongFeatureCount { expected: usize, actual: usize },

    #[error("Feature at index {index} must be a finite number")]
    NonFiniteFeature { index: usize },
}

impl ValidationError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MissingFeatures => "missing_features",
            ValidationError::InvalidType { .. } => "invalid_type",
            ValidationError::WrongFeatureCount { .. } => "wrong_feature_count",
            ValidationError::NonFiniteFeature { .. } => "non_finite_feature",
        }
    }
}

impl From<FeatureVectorError> for ValidationError {
    fn from(err: FeatureVectorError) -> Self {
        match err {
            FeatureVectorError::WrongLength { expected, actual } => {
                ValidationError::WrongFeatureCount { expected, actual }
            }
            FeatureVectorError::NonFinite { index } => ValidationError::NonFiniteFeature { index },
        }
    }
}

/// Validate a raw prediction payload
pub fn validate(payload: &Value) -> Result<FeatureVector, ValidationError> {
    let features = match payload.get(FEATURES_FIELD) {
        None | Some(Value::Null) => return Err(ValidationError::MissingFeatures),
        Some(features) => features,
    };

    let entries = features
        .as_array()
        .ok_or(ValidationError::InvalidType { index: None })?;

    let mut values = Vec::with_capacity(FEATURE_COUNT);
    for (index, entry) in entries.iter().enumerate() {
        let value = entry
            .as_f64()
            .ok_or(ValidationError::InvalidType { index: Some(index) })?;
        values.push(value);
    }

    Ok(FeatureVector::from_slice(&values)?)
}
