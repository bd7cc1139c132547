//! Health check handler

use axum::{extract::State, Json};

use crate::models::HealthResponse;
use crate::AppState;

/// Always 200, whether or not a model is loaded
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.service.health().into())
}
