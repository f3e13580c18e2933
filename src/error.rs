/*
 * Responsibility
 * - HTTP-facing AppError
 * - IntoResponse (HTTP status / JSON error body)
 * - Authorizer failures are converted here; credential problems never reach this type
 * - Body extraction failures keep their status but share the JSON error body
 */
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::authorizer::AuthorizationError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unreadable event: {message}")]
    InvalidBody { status: StatusCode, message: String },
    #[error("authorizer unavailable")]
    Unavailable,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::InvalidBody { status, message } => {
                let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "EVENT_TOO_LARGE"
                } else {
                    "INVALID_AUTHORIZER_EVENT"
                };
                (status, code, message)
            }
            AppError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AUTHORIZER_UNAVAILABLE",
                "authorizer unavailable".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthorizationError> for AppError {
    fn from(e: AuthorizationError) -> Self {
        if e.is_internal() {
            AppError::Unavailable
        } else {
            // The engine turns credential failures into deny decisions.
            AppError::Internal
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
