use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use tenement_core::Jurisdiction;
use tenement_core::error::AppError;

/// API error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown jurisdiction: {0}")]
    InvalidJurisdiction(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::InvalidJurisdiction(code) => {
                let valid: Vec<&str> = Jurisdiction::ALL.iter().map(|j| j.code()).collect();
                (
                    StatusCode::BAD_REQUEST,
                    "invalid_jurisdiction",
                    format!("Unknown jurisdiction: {}", code),
                    Some(format!("Expected one of {}", valid.join(", "))),
                )
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None)
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidJurisdiction(code) => ApiError::InvalidJurisdiction(code),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
