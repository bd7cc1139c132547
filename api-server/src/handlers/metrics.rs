//! Metrics handlers

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};

use crate::models::MetricsResponse;
use crate::AppState;

pub async fn summary(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(state.service.metrics_snapshot().into())
}

/// Prometheus text exposition
pub async fn prometheus(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.service.metrics_snapshot().to_prometheus(),
    )
}
