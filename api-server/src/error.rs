//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use iris_core::{PredictionError, ValidationError};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Prediction pipeline errors (validation, model availability)
    Prediction(PredictionError),

    // Request body is not JSON
    MalformedJson,

    // Request body could not be read (too large, aborted)
    BodyRejected { status: StatusCode, message: String },

    // Unroutable path
    NotFound,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Prediction(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Prediction(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::MalformedJson => StatusCode::BAD_REQUEST,
            AppError::BodyRejected { status, .. } => *status,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Prediction(e) => e.kind(),
            AppError::MalformedJson => "malformed_json",
            AppError::BodyRejected { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                "payload_too_large"
            }
            AppError::BodyRejected { .. } => "invalid_body",
            AppError::NotFound => "not_found",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error_message = match &self {
            AppError::Prediction(e) => e.to_string(),
            AppError::MalformedJson => "Request body must be valid JSON".to_string(),
            AppError::BodyRejected { message, .. } => message.clone(),
            AppError::NotFound => "Endpoint not found".to_string(),
        };

        let mut body = json!({
            "error": error_message,
            "kind": self.kind(),
            "status": status.as_u16()
        });

        if let AppError::Prediction(PredictionError::Validation(ValidationError::WrongFeatureCount {
            expected,
            actual,
        })) = &self
        {
            body["expected"] = json!(expected);
            body["actual"] = json!(actual);
        }

        (status, Json(body)).into_response()
    }
}

impl From<PredictionError> for AppError {
    fn from(err: PredictionError) -> Self {
        AppError::Prediction(err)
    }
}
