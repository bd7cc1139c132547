//! Model Store - owns the trained classifier
//!
//! Two states: `Unloaded` (initial) and `Ready` (terminal). The transition
//! happens at most once, behind a `OnceCell` barrier: concurrent `load()`
//! callers block until the first one finishes and then share the same
//! `Arc<LoadedModel>`. After that, inference is lock-free.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_MODEL_PATH;
use crate::logic::features::{FeatureVector, FEATURE_COUNT, FEATURE_DISPLAY_NAMES};
use super::artifact::{load_artifact, save_artifact, ModelArtifact};
use super::dataset::Dataset;
use super::forest::{argmax, ClassProbabilities, TrainingConfig};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("model not loaded")]
    NotLoaded,

    #[error("model load failed: {0}")]
    LoadFailed(String),

    #[error("model persist failed: {0}")]
    PersistFailed(String),
}

// ============================================================================
// INFERENCE ENGINE TRAIT
// ============================================================================

/// Seam between the prediction pipeline and whatever answers inference queries
pub trait InferenceEngine: Send + Sync {
    /// Class probabilities in class-index order
    fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities, ModelError>;
    fn is_loaded(&self) -> bool;
    fn info(&self) -> Option<ModelInfo>;
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Where the served model came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// Read from the artifact file
    Disk,
    /// No artifact existed; trained on startup
    Training,
    /// Artifact existed but was unusable; trained and overwritten
    Retrained,
}

/// Model Store settings
#[derive(Debug, Clone)]
pub struct ModelStoreConfig {
    pub model_path: PathBuf,
    /// Train when the artifact is missing or unusable
    pub auto_train: bool,
    pub training: TrainingConfig,
}

impl Default for ModelStoreConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            auto_train: true,
            training: TrainingConfig::default(),
        }
    }
}

/// A model in the `Ready` state
#[derive(Debug)]
pub struct LoadedModel {
    pub artifact: ModelArtifact,
    pub source: ModelSource,
    pub loaded_at: DateTime<Utc>,
}

/// Model description for the info endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub classes: Vec<String>,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub artifact_id: Uuid,
    pub source: ModelSource,
    pub trained_at: DateTime<Utc>,
    pub loaded_at: DateTime<Utc>,
    pub training_accuracy: f64,
    pub feature_importances: Vec<FeatureImportance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

impl LoadedModel {
    fn new(artifact: ModelArtifact, source: ModelSource) -> Self {
        Self {
            artifact,
            source,
            loaded_at: Utc::now(),
        }
    }

    pub fn info(&self) -> ModelInfo {
        let artifact = &self.artifact;
        ModelInfo {
            model_type: artifact.model_type.clone(),
            classes: artifact.classes.clone(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_DISPLAY_NAMES.iter().map(|s| s.to_string()).collect(),
            n_estimators: artifact.forest.n_estimators(),
            max_depth: artifact.config.max_depth,
            artifact_id: artifact.id,
            source: self.source,
            trained_at: artifact.trained_at,
            loaded_at: self.loaded_at,
            training_accuracy: artifact.training_accuracy,
            feature_importances: FEATURE_DISPLAY_NAMES
                .iter()
                .zip(artifact.feature_importances.iter())
                .map(|(name, importance)| FeatureImportance {
                    feature: name.to_string(),
                    importance: *importance,
                })
                .collect(),
        }
    }
}

// ============================================================================
// MODEL STORE
// ============================================================================

pub struct ModelStore {
    config: ModelStoreConfig,
    dataset: Option<Dataset>,
    model: OnceCell<Arc<LoadedModel>>,
    training_runs: AtomicUsize,
}

impl ModelStore {
    /// Store that trains on the embedded Iris dataset when needed
    pub fn new(config: ModelStoreConfig) -> Self {
        Self::with_dataset(config, Some(Dataset::iris()))
    }

    /// Store with an explicit training set; `None` means training is impossible
    pub fn with_dataset(config: ModelStoreConfig, dataset: Option<Dataset>) -> Self {
        Self {
            config,
            dataset,
            model: OnceCell::new(),
            training_runs: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &ModelStoreConfig {
        &self.config
    }

    /// Load the artifact, or train and persist one. Runs at most once successfully.
    pub fn load(&self) -> Result<Arc<LoadedModel>, ModelError> {
        self.model
            .get_or_try_init(|| self.load_or_train().map(Arc::new))
            .cloned()
    }

    /// The model, if `Ready`
    pub fn get(&self) -> Option<&Arc<LoadedModel>> {
        self.model.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// (top class index, class probabilities)
    pub fn predict(&self, features: &FeatureVector) -> Result<(usize, ClassProbabilities), ModelError> {
        let probabilities = self.predict_proba(features)?;
        Ok((argmax(&probabilities), probabilities))
    }

    pub fn info(&self) -> Option<ModelInfo> {
        self.model.get().map(|m| m.info())
    }

    /// How many times this store has trained a model
    pub fn training_runs(&self) -> usize {
        self.training_runs.load(Ordering::SeqCst)
    }

    /// Train a fresh artifact and overwrite the file, without touching the served model
    pub fn train_and_save(&self) -> Result<ModelArtifact, ModelError> {
        let artifact = self.train()?;
        save_artifact(&artifact, &self.config.model_path)
            .map_err(|e| ModelError::PersistFailed(e.to_string()))?;
        Ok(artifact)
    }

    fn train(&self) -> Result<ModelArtifact, ModelError> {
        let dataset = self
            .dataset
            .as_ref()
            .ok_or_else(|| ModelError::LoadFailed("no training dataset available".to_string()))?;

        self.training_runs.fetch_add(1, Ordering::SeqCst);
        ModelArtifact::train(dataset, &self.config.training)
            .map_err(|e| ModelError::LoadFailed(format!("training failed: {}", e)))
    }

    fn load_or_train(&self) -> Result<LoadedModel, ModelError> {
        let path = &self.config.model_path;

        let unusable = if path.exists() {
            log::info!("Loading existing model from {}", path.display());
            match load_artifact(path) {
                Ok(artifact) => {
                    log::info!("Model {} loaded from disk", artifact.id);
                    return Ok(LoadedModel::new(artifact, ModelSource::Disk));
                }
                Err(e) => {
                    log::warn!("Model artifact at {} is unusable: {}", path.display(), e);
                    Some(e)
                }
            }
        } else {
            None
        };

        if !self.config.auto_train {
            let reason = match unusable {
                Some(e) => e.to_string(),
                None => format!("no model artifact at {}", path.display()),
            };
            log::error!("Model unavailable and auto-training is disabled: {}", reason);
            return Err(ModelError::LoadFailed(reason));
        }

        log::info!("Training new model");
        let artifact = self.train()?;

        if let Err(e) = save_artifact(&artifact, path) {
            log::warn!("Failed to persist model to {}: {} (serving from memory)", path.display(), e);
        }

        let source = if unusable.is_some() { ModelSource::Retrained } else { ModelSource::Training };
        log::info!("Model loaded successfully (source: {:?})", source);

        Ok(LoadedModel::new(artifact, source))
    }
}

impl InferenceEngine for ModelStore {
    fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities, ModelError> {
        let model = self.model.get().ok_or(ModelError::NotLoaded)?;
        Ok(model.artifact.predict_proba(features))
    }

    fn is_loaded(&self) -> bool {
        ModelStore::is_loaded(self)
    }

    fn info(&self) -> Option<ModelInfo> {
        ModelStore::info(self)
    }
}
