//! Model Artifact - trained model and its on-disk format
//!
//! Persisted as a JSON envelope:
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "layout_version": 1,
//!   "layout_hash": 1234567890,
//!   "checksum": "<sha256 hex of the model JSON>",
//!   "model": { ... ModelArtifact ... }
//! }
//! ```
//!
//! `model` is kept as raw JSON on both sides, so the checksum covers exactly
//! the bytes in the file.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::logic::features::layout::{validate_layout, LayoutMismatchError, FEATURE_LAYOUT};
use crate::logic::features::{layout_hash, FeatureVector, FEATURE_COUNT, FEATURE_VERSION};
use super::classes::ClassLabel;
use super::dataset::Dataset;
use super::forest::{ClassProbabilities, ForestError, RandomForest, TrainingConfig};
use super::scaler::StandardScaler;

/// Bump when the envelope or `ModelArtifact` shape changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Reported model type
pub const MODEL_TYPE: &str = "RandomForestClassifier";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unsupported artifact format v{found} (expected v{})", ARTIFACT_FORMAT_VERSION)]
    UnsupportedFormat { found: u32 },

    #[error(transparent)]
    LayoutMismatch(#[from] LayoutMismatchError),

    #[error("checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("class list {found:?} does not match {expected:?}")]
    ClassMismatch { expected: Vec<String>, found: Vec<String> },

    #[error("feature list {found:?} does not match the current layout")]
    FeatureMismatch { found: Vec<String> },

    #[error("model structure rejected: {0}")]
    Malformed(#[from] ForestError),
}

// ============================================================================
// ARTIFACT
// ============================================================================

/// Trained classifier plus the metadata needed to serve and describe it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub id: Uuid,
    pub model_type: String,
    pub trained_at: DateTime<Utc>,
    /// Class names in class-index order
    pub classes: Vec<String>,
    pub feature_names: Vec<String>,
    pub config: TrainingConfig,
    pub scaler: StandardScaler,
    pub forest: RandomForest,
    pub training_accuracy: f64,
    pub feature_importances: [f64; FEATURE_COUNT],
}

impl ModelArtifact {
    /// Fit scaler and forest on `dataset`
    pub fn train(dataset: &Dataset, config: &TrainingConfig) -> Result<Self, ForestError> {
        let started = std::time::Instant::now();

        let scaler = StandardScaler::fit(dataset.features());
        let scaled = scaler.transform_matrix(dataset.features());
        let fit = RandomForest::fit(&scaled, dataset.targets(), config)?;
        let training_accuracy = fit.forest.score(&scaled, dataset.targets());

        log::info!(
            "Model trained: {} trees on {} samples in {} ms (training accuracy {:.4})",
            fit.forest.n_estimators(),
            dataset.len(),
            started.elapsed().as_millis(),
            training_accuracy
        );

        Ok(Self {
            id: Uuid::new_v4(),
            model_type: MODEL_TYPE.to_string(),
            trained_at: Utc::now(),
            classes: ClassLabel::names(),
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            config: config.clone(),
            scaler,
            forest: fit.forest,
            training_accuracy,
            feature_importances: fit.feature_importances,
        })
    }

    /// Standardize then run the forest
    pub fn predict_proba(&self, features: &FeatureVector) -> ClassProbabilities {
        let scaled = self.scaler.transform(features.as_array());
        self.forest.predict_proba(&scaled)
    }

    /// Reject artifacts whose class or feature mapping differs from this build
    pub fn check(&self) -> Result<(), ArtifactError> {
        let expected = ClassLabel::names();
        if self.classes != expected {
            return Err(ArtifactError::ClassMismatch {
                expected,
                found: self.classes.clone(),
            });
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_LAYOUT.iter().copied()) {
            return Err(ArtifactError::FeatureMismatch {
                found: self.feature_names.clone(),
            });
        }
        self.forest.check()?;
        Ok(())
    }
}

// ============================================================================
// STORAGE
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    format_version: u32,
    layout_version: u8,
    layout_hash: u32,
    checksum: String,
    model: Box<RawValue>,
}

fn checksum(model: &RawValue) -> String {
    hex::encode(Sha256::digest(model.get().as_bytes()))
}

/// Save artifact to disk (write to a unique sibling temp file, then rename)
pub fn save_artifact(artifact: &ModelArtifact, path: &Path) -> Result<(), ArtifactError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let model = RawValue::from_string(serde_json::to_string(artifact)?)?;
    let envelope = ArtifactEnvelope {
        format_version: ARTIFACT_FORMAT_VERSION,
        layout_version: FEATURE_VERSION,
        layout_hash: layout_hash(),
        checksum: checksum(&model),
        model,
    };

    // Dropped (and removed) on any early return
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&serde_json::to_vec(&envelope)?)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    log::info!("Model artifact {} saved to {}", artifact.id, path.display());
    Ok(())
}

/// Load artifact from disk with integrity and compatibility checks
pub fn load_artifact(path: &Path) -> Result<ModelArtifact, ArtifactError> {
    let data = fs::read(path)?;
    let envelope: ArtifactEnvelope = serde_json::from_slice(&data)?;

    if envelope.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedFormat { found: envelope.format_version });
    }

    validate_layout(envelope.layout_version, envelope.layout_hash)?;

    let actual = checksum(&envelope.model);
    if actual != envelope.checksum {
        return Err(ArtifactError::ChecksumMismatch {
            expected: envelope.checksum,
            actual,
        });
    }

    let artifact: ModelArtifact = serde_json::from_str(envelope.model.get())?;
    artifact.check()?;

    Ok(artifact)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn quick_artifact() -> ModelArtifact {
        let config = TrainingConfig { n_estimators: 5, ..Default::default() };
        ModelArtifact::train(&Dataset::iris(), &config).unwrap()
    }

    fn rewrite_envelope(path: &Path, edit: impl FnOnce(&mut Value)) {
        let mut envelope: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        edit(&mut envelope);
        fs::write(path, serde_json::to_vec(&envelope).unwrap()).unwrap();
    }

    #[test]
    fn test_save_load_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("iris_model.json");

        let original = quick_artifact();
        save_artifact(&original, &path).unwrap();

        let loaded = load_artifact(&path).unwrap();
        assert_eq!(loaded, original);

        let sample = FeatureVector::new([5.9, 3.0, 5.1, 1.8]).unwrap();
        assert_eq!(loaded.predict_proba(&sample), original.predict_proba(&sample));
    }

    #[test]
    fn test_saved_artifacts_load_for_any_seed() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Dataset::iris();

        for seed in 0..12 {
            let path = dir.path().join(format!("model_{seed}.json"));
            let config = TrainingConfig { n_estimators: 3, seed, ..Default::default() };
            let artifact = ModelArtifact::train(&dataset, &config).unwrap();

            save_artifact(&artifact, &path).unwrap();
            let loaded = load_artifact(&path)
                .unwrap_or_else(|e| panic!("seed {seed}: {e}"));
            assert_eq!(loaded, artifact, "seed {seed}");
        }
    }

    #[test]
    fn test_overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iris_model.json");

        save_artifact(&quick_artifact(), &path).unwrap();
        let second = quick_artifact();
        save_artifact(&second, &path).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("iris_model.json")]);
        assert_eq!(load_artifact(&path).unwrap().id, second.id);
    }

    #[test]
    fn test_failed_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the artifact file should go makes the rename fail
        let path = dir.path().join("iris_model.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"").unwrap();

        assert!(matches!(save_artifact(&quick_artifact(), &path), Err(ArtifactError::Io(_))));

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("iris_model.json")]);
    }

    #[test]
    fn test_reject_tampered_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        save_artifact(&quick_artifact(), &path).unwrap();

        rewrite_envelope(&path, |env| {
            env["model"]["training_accuracy"] = serde_json::json!(0.5);
        });

        assert!(matches!(load_artifact(&path), Err(ArtifactError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_reject_layout_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        save_artifact(&quick_artifact(), &path).unwrap();

        rewrite_envelope(&path, |env| {
            env["layout_hash"] = serde_json::json!(!layout_hash());
        });

        assert!(matches!(load_artifact(&path), Err(ArtifactError::LayoutMismatch(_))));
    }

    #[test]
    fn test_reject_future_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        save_artifact(&quick_artifact(), &path).unwrap();

        rewrite_envelope(&path, |env| {
            env["format_version"] = serde_json::json!(ARTIFACT_FORMAT_VERSION + 1);
        });

        assert!(matches!(
            load_artifact(&path),
            Err(ArtifactError::UnsupportedFormat { found }) if found == ARTIFACT_FORMAT_VERSION + 1
        ));
    }

    #[test]
    fn test_reject_reordered_classes() {
        let mut artifact = quick_artifact();
        artifact.classes.swap(0, 2);
        assert!(matches!(artifact.check(), Err(ArtifactError::ClassMismatch { .. })));
    }

    #[test]
    fn test_reject_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"\x80not json").unwrap();
        assert!(matches!(load_artifact(&path), Err(ArtifactError::Serialization(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(load_artifact(&missing), Err(ArtifactError::Io(_))));
    }
}
