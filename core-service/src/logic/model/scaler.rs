//! Standard Scaler
//!
//! Per-feature standardization `(x - mean) / std` fitted on training data.
//! Uses population standard deviation; constant features get a scale of 1.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::logic::features::FEATURE_COUNT;

/// Fitted standardization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; FEATURE_COUNT],
    pub scale: [f64; FEATURE_COUNT],
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self {
            mean: [0.0; FEATURE_COUNT],
            scale: [1.0; FEATURE_COUNT],
        }
    }
}

impl StandardScaler {
    /// Fit on a `(n_samples, FEATURE_COUNT)` matrix
    pub fn fit(features: &Array2<f64>) -> Self {
        let mut scaler = Self::default();
        if features.nrows() == 0 {
            return scaler;
        }

        if let Some(mean) = features.mean_axis(Axis(0)) {
            for (dst, src) in scaler.mean.iter_mut().zip(mean.iter()) {
                *dst = *src;
            }
        }

        let std = features.std_axis(Axis(0), 0.0);
        for (dst, src) in scaler.scale.iter_mut().zip(std.iter()) {
            *dst = if *src > f64::EPSILON { *src } else { 1.0 };
        }

        scaler
    }

    /// Standardize one sample
    pub fn transform(&self, values: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            out[i] = (values[i] - self.mean[i]) / self.scale[i];
        }
        out
    }

    /// Standardize a whole matrix
    pub fn transform_matrix(&self, features: &Array2<f64>) -> Array2<f64> {
        let mut out = features.clone();
        for mut row in out.rows_mut() {
            for (i, v) in row.iter_mut().enumerate() {
                *v = (*v - self.mean[i]) / self.scale[i];
            }
        }
        out
    }
}
