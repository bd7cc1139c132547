//! Iris prediction server
//!
//! Serves a Random Forest classifier for the Iris dataset over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      IRIS SERVER                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐      ┌──────────────────────────────────┐    │
//! │  │  Router   │ ───▶ │  PredictionService (iris-core)   │    │
//! │  │  (Axum)   │      │  validate → infer → record       │    │
//! │  └───────────┘      └───────────────┬──────────────────┘    │
//! │                                     ▼                       │
//! │                          ┌────────────────────┐             │
//! │                          │  ModelStore        │             │
//! │                          │  models/*.json     │             │
//! │                          └────────────────────┘             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `iris-server` (or `iris-server serve`) runs the HTTP server.
//! `iris-server train` retrains the model, overwrites the artifact and exits.

mod config;
mod error;
mod handlers;
mod models;
mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use iris_core::{ModelStore, PredictionService};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
    timeout::TimeoutLayer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let _log_guard = telemetry::init(&config)?;

    match std::env::args().nth(1).as_deref() {
        None | Some("serve") => serve(config).await,
        Some("train") => train(&config),
        Some(other) => anyhow::bail!("unknown command '{}' (expected 'serve' or 'train')", other),
    }
}

async fn serve(config: config::Config) -> anyhow::Result<()> {
    tracing::info!("Iris prediction server v{} starting...", models::VERSION);
    tracing::info!("Model path: {}", config.model_path.display());

    let service = Arc::new(PredictionService::new(ModelStore::new(config.model_store_config())));

    // Load before accepting traffic; training is CPU-bound
    let loader = Arc::clone(&service);
    match tokio::task::spawn_blocking(move || loader.load_model()).await? {
        Ok(model) => tracing::info!(
            "Model {} ready (source: {:?})",
            model.artifact.id,
            model.source
        ),
        Err(e) => tracing::error!("Model unavailable, predictions will return 503: {}", e),
    }

    // Build application state
    let state = AppState {
        service,
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Retrain, persist and report
fn train(config: &config::Config) -> anyhow::Result<()> {
    let store = ModelStore::new(config.model_store_config());
    let artifact = store.train_and_save().context("training failed")?;

    println!("Model saved to {}", config.model_path.display());
    println!("Artifact: {}", artifact.id);
    println!("Training accuracy: {:.4}", artifact.training_accuracy);
    println!("Feature importances:");
    for (name, importance) in iris_core::logic::features::FEATURE_DISPLAY_NAMES
        .iter()
        .zip(artifact.feature_importances.iter())
    {
        println!("  {:<20} {:.4}", name, importance);
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    let api_routes = Router::new()
        .route("/api/model/info", get(handlers::model::info))
        .route("/api/metrics", get(handlers::metrics::summary))
        .route("/api/predict", post(handlers::predict::predict));

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/metrics", get(handlers::metrics::prometheus))
        .merge(api_routes)
        .fallback(handlers::not_found)
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
