//! Prediction handler

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use iris_core::PredictionResult;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// POST /api/predict
///
/// The body is read and parsed here rather than through the `Json` extractor
/// so unreadable, oversized and malformed bodies get the service's error
/// shape and are still counted.
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Json<PredictionResult>> {
    let started = Instant::now();

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!("Request body rejected: {}", rejection.body_text());
            state.service.record_rejected(started);
            return Err(AppError::BodyRejected {
                status: rejection.status(),
                message: rejection.body_text(),
            });
        }
    };

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Malformed JSON body: {}", e);
            state.service.record_rejected(started);
            return Err(AppError::MalformedJson);
        }
    };

    let result = state.service.predict(&payload)?;
    Ok(Json(result))
}
