//! Model info handler

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::models::ModelInfoResponse;
use crate::AppState;

pub async fn info(State(state): State<AppState>) -> AppResult<Json<ModelInfoResponse>> {
    let info = state.service.model_info()?;
    Ok(Json(info.into()))
}
