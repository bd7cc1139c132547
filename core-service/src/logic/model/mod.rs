//! Model Module - Iris classifier
//!
//! - `classes` - fixed class index ↔ label mapping
//! - `dataset` - embedded training data
//! - `scaler` / `forest` - the trained pipeline
//! - `artifact` - persisted model format
//! - `store` - one-time load/train and inference

pub mod classes;
pub mod dataset;
pub mod scaler;
pub mod forest;
pub mod artifact;
pub mod store;

#[cfg(test)]
mod tests;

// Re-export common types
pub use classes::{ClassLabel, CLASS_COUNT};
pub use dataset::Dataset;
pub use forest::{argmax, ClassProbabilities, RandomForest, TrainingConfig};
pub use artifact::{ArtifactError, ModelArtifact, MODEL_TYPE};
pub use store::{
    FeatureImportance, InferenceEngine, LoadedModel, ModelError, ModelInfo, ModelSource, ModelStore,
    ModelStoreConfig,
};
