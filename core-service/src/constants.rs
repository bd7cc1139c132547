//! Central Configuration Constants
//!
//! Single source of truth for model-related defaults.

use std::path::PathBuf;

/// Default persisted model location (relative to the working directory)
pub const DEFAULT_MODEL_PATH: &str = "models/iris_model.json";

/// Train a model on startup when none can be loaded
pub const DEFAULT_AUTO_TRAIN: bool = true;

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get model path from environment or use default
pub fn get_model_path() -> PathBuf {
    std::env::var("MODEL_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
}

/// Check if auto-training is enabled
pub fn is_auto_train_enabled() -> bool {
    std::env::var("MODEL_AUTO_TRAIN")
        .map(|s| parse_flag(&s))
        .unwrap_or(DEFAULT_AUTO_TRAIN)
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value != "false" && value != "0" && value != "no" && value != "off"
}
