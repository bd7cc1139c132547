//! HTTP handlers

pub mod health;
pub mod model;
pub mod predict;
pub mod metrics;

use axum::http::Uri;

use crate::error::AppError;

/// Fallback for unrouted paths
pub async fn not_found(uri: Uri) -> AppError {
    tracing::warn!("404 error: {}", uri.path());
    AppError::NotFound
}
