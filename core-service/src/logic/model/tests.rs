//! Model Store tests: load/train lifecycle, persistence and scenarios

use std::sync::Arc;

use super::artifact::load_artifact;
use super::store::{InferenceEngine, ModelError, ModelSource, ModelStore, ModelStoreConfig};
use super::{ClassLabel, Dataset, TrainingConfig};
use crate::logic::features::FeatureVector;

fn store_at(dir: &tempfile::TempDir, auto_train: bool) -> ModelStore {
    ModelStore::new(ModelStoreConfig {
        model_path: dir.path().join("models").join("iris_model.json"),
        auto_train,
        training: TrainingConfig::default(),
    })
}

fn fv(values: [f64; 4]) -> FeatureVector {
    FeatureVector::new(values).unwrap()
}

#[test]
fn test_unloaded_store_rejects_inference() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir, true);

    assert!(!store.is_loaded());
    assert!(store.info().is_none());
    assert_eq!(store.predict(&fv([5.1, 3.5, 1.4, 0.2])), Err(ModelError::NotLoaded));
}

#[test]
fn test_first_load_trains_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir, true);

    let model = store.load().unwrap();
    assert_eq!(model.source, ModelSource::Training);
    assert!(store.is_loaded());
    assert_eq!(store.training_runs(), 1);

    let on_disk = load_artifact(&store.config().model_path).unwrap();
    assert_eq!(on_disk, model.artifact);
}

#[test]
fn test_second_store_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let first = store_at(&dir, true);
    let trained = first.load().unwrap();

    let second = store_at(&dir, false);
    let loaded = second.load().unwrap();

    assert_eq!(loaded.source, ModelSource::Disk);
    assert_eq!(second.training_runs(), 0);
    assert_eq!(loaded.artifact.id, trained.artifact.id);

    let sample = fv([6.1, 2.8, 4.7, 1.2]);
    assert_eq!(first.predict(&sample), second.predict(&sample));
}

#[test]
fn test_load_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir, true);

    let a = store.load().unwrap();
    let b = store.load().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(store.training_runs(), 1);
}

#[test]
fn test_concurrent_load_trains_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir, true);

    let models: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| store.load().unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(store.training_runs(), 1);
    assert!(models.iter().all(|m| Arc::ptr_eq(m, &models[0])));
}

#[test]
fn test_corrupt_artifact_is_retrained() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir, true);
    let path = store.config().model_path.clone();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"{ definitely not a model").unwrap();

    let model = store.load().unwrap();
    assert_eq!(model.source, ModelSource::Retrained);

    // The bad file was replaced by a good one
    assert!(load_artifact(&path).is_ok());
}

#[test]
fn test_corrupt_artifact_without_auto_train_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir, false);
    let path = store.config().model_path.clone();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"garbage").unwrap();

    assert!(matches!(store.load(), Err(ModelError::LoadFailed(_))));
    assert!(!store.is_loaded());
    assert_eq!(store.training_runs(), 0);
}

#[test]
fn test_missing_artifact_without_auto_train_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir, false);

    let err = store.load().unwrap_err();
    assert!(matches!(err, ModelError::LoadFailed(msg) if msg.contains("no model artifact")));
    assert!(!InferenceEngine::is_loaded(&store));
}

#[test]
fn test_missing_dataset_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = ModelStoreConfig {
        model_path: dir.path().join("model.json"),
        ..Default::default()
    };
    let store = ModelStore::with_dataset(config, None);

    assert!(matches!(store.load(), Err(ModelError::LoadFailed(_))));
    assert!(!store.is_loaded());
}

#[test]
fn test_persist_failure_still_serves_from_memory() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the model directory should be
    let blocker = dir.path().join("models");
    std::fs::write(&blocker, b"").unwrap();

    let store = ModelStore::new(ModelStoreConfig {
        model_path: blocker.join("iris_model.json"),
        auto_train: true,
        training: TrainingConfig { n_estimators: 10, ..Default::default() },
    });

    let model = store.load().unwrap();
    assert_eq!(model.source, ModelSource::Training);
    assert!(store.predict(&fv([5.0, 3.4, 1.5, 0.2])).is_ok());
}

#[test]
fn test_known_samples_are_classified() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir, true);
    store.load().unwrap();

    let cases = [
        ([5.1, 3.5, 1.4, 0.2], ClassLabel::Setosa),
        ([7.0, 3.2, 4.7, 1.4], ClassLabel::Versicolor),
        ([6.3, 3.3, 6.0, 2.5], ClassLabel::Virginica),
    ];

    for (features, expected) in cases {
        let (index, probabilities) = store.predict(&fv(features)).unwrap();
        assert_eq!(ClassLabel::from_index(index), Some(expected), "features {:?}", features);
        assert!(probabilities[index] >= 0.5);
        assert!((probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    }
}

#[test]
fn test_repeated_predictions_are_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir, true);
    store.load().unwrap();

    let sample = fv([6.0, 2.7, 5.1, 1.6]);
    let (_, first) = store.predict(&sample).unwrap();
    for _ in 0..20 {
        let (_, again) = store.predict(&sample).unwrap();
        assert_eq!(first.map(f64::to_bits), again.map(f64::to_bits));
    }
}

#[test]
fn test_info_describes_loaded_model() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir, true);
    store.load().unwrap();

    let info = store.info().unwrap();
    assert_eq!(info.model_type, "RandomForestClassifier");
    assert_eq!(info.classes, vec!["Setosa", "Versicolor", "Virginica"]);
    assert_eq!(info.feature_count, 4);
    assert_eq!(info.n_estimators, 100);
    assert_eq!(info.max_depth, Some(10));
    assert_eq!(info.feature_importances.len(), 4);
    assert!(info.training_accuracy > 0.95);
}

#[test]
fn test_train_and_save_overwrites_without_swapping_served_model() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir, true);
    let served = store.load().unwrap();

    let fresh = store.train_and_save().unwrap();
    assert_ne!(fresh.id, served.artifact.id);
    assert_eq!(load_artifact(&store.config().model_path).unwrap().id, fresh.id);
    assert!(Arc::ptr_eq(&store.load().unwrap(), &served));
}

#[test]
fn test_custom_dataset_trains() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = Dataset::from_rows(
        vec![[1.0, 1.0, 1.0, 1.0], [1.1, 1.0, 1.0, 1.0], [9.0, 9.0, 9.0, 9.0], [9.1, 9.0, 9.0, 9.0]],
        vec![0, 0, 2, 2],
    );
    let store = ModelStore::with_dataset(
        ModelStoreConfig {
            model_path: dir.path().join("tiny.json"),
            auto_train: true,
            training: TrainingConfig { n_estimators: 5, ..Default::default() },
        },
        dataset,
    );
    store.load().unwrap();

    let (index, _) = store.predict(&fv([1.0, 1.0, 1.0, 1.0])).unwrap();
    assert_eq!(index, ClassLabel::Setosa.index());
}
