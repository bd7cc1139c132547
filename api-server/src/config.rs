//! Configuration module

use std::env;
use std::path::PathBuf;

use iris_core::constants::{get_model_path, is_auto_train_enabled};
use iris_core::{ModelStoreConfig, TrainingConfig};

/// Default listen port
pub const DEFAULT_PORT: u16 = 5000;

/// Default log file
pub const DEFAULT_LOG_FILE: &str = "logs/app.log";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Persisted model artifact
    pub model_path: PathBuf,

    /// Train a model when none can be loaded
    pub auto_train: bool,

    /// Log file destination; `None` logs to stdout only
    pub log_file: Option<PathBuf>,

    /// Environment (development, production)
    pub environment: String,

    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            model_path: PathBuf::from(iris_core::constants::DEFAULT_MODEL_PATH),
            auto_train: iris_core::constants::DEFAULT_AUTO_TRAIN,
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            environment: "development".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_path: get_model_path(),

            auto_train: is_auto_train_enabled(),

            log_file: match env::var("LOG_FILE") {
                Ok(path) if path.trim().is_empty() => None,
                Ok(path) => Some(PathBuf::from(path)),
                Err(_) => defaults.log_file,
            },

            environment: env::var("ENVIRONMENT")
                .unwrap_or(defaults.environment),

            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .filter(|t| *t > 0)
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Settings for the model store
    pub fn model_store_config(&self) -> ModelStoreConfig {
        ModelStoreConfig {
            model_path: self.model_path.clone(),
            auto_train: self.auto_train,
            training: TrainingConfig::default(),
        }
    }
}
