//! Feature Vector - Core data structure for ML input
//!
//! A `FeatureVector` can only be built from exactly `FEATURE_COUNT` finite
//! values, so anything past the request validator is already well formed.

use serde::Serialize;
use super::layout::FEATURE_COUNT;

/// Immutable, validated model input
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

/// Reason raw values could not become a `FeatureVector`
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureVectorError {
    #[error("expected {expected} features, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("feature at index {index} is not a finite number")]
    NonFinite { index: usize },
}

impl FeatureVector {
    /// Build from a fixed-size array, rejecting NaN/Infinity
    pub fn new(values: [f64; FEATURE_COUNT]) -> Result<Self, FeatureVectorError> {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(FeatureVectorError::NonFinite { index });
        }
        Ok(Self { values })
    }

    /// Build from a slice of any length
    pub fn from_slice(values: &[f64]) -> Result<Self, FeatureVectorError> {
        let array: [f64; FEATURE_COUNT] = values.try_into().map_err(|_| FeatureVectorError::WrongLength {
            expected: FEATURE_COUNT,
            actual: values.len(),
        })?;
        Self::new(array)
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_accepts_exact_length() {
        let v = FeatureVector::from_slice(&[5.1, 3.5, 1.4, 0.2]).unwrap();
        assert_eq!(v.as_array(), &[5.1, 3.5, 1.4, 0.2]);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        let err = FeatureVector::from_slice(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err, FeatureVectorError::WrongLength { expected: 4, actual: 2 });
    }

    #[test]
    fn test_rejects_non_finite() {
        let err = FeatureVector::new([1.0, f64::NAN, 1.0, 1.0]).unwrap_err();
        assert_eq!(err, FeatureVectorError::NonFinite { index: 1 });

        assert!(FeatureVector::new([1.0, 1.0, 1.0, f64::INFINITY]).is_err());
    }
}
