//! API error types with IntoResponse
//!
//! Errors are converted to the response envelope with a status code per
//! error class. Infrastructure details are logged, never returned.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use super::response::ApiResponse;
use crate::app::AppError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Request failed schema validation (400)
    Validation(ValidationError),

    /// Use case failed (400, 404 or 503)
    App(AppError),

    /// Missing or rejected bearer token (401)
    Unauthorized { reason: &'static str },

    /// Authenticated, but the role is not admitted (403)
    Forbidden { required: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::App(AppError::Domain(_) | AppError::DuplicateUser { .. }) => StatusCode::BAD_REQUEST,
            Self::App(AppError::UserNotFound { .. }) => StatusCode::NOT_FOUND,
            Self::App(AppError::Infra(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body: ApiResponse<Value> = match &self {
            Self::Validation(e) => ApiResponse::error(
                "INVALID_REQUEST",
                "Request validation failed",
                Some(json!([{ "loc": e.field(), "msg": e.to_string() }])),
            ),
            Self::App(AppError::Infra(e)) => {
                // Log the actual error, return generic message
                tracing::error!(
                    code = e.code(),
                    error = %e,
                    source = ?std::error::Error::source(e).map(ToString::to_string),
                    "Infrastructure error"
                );
                ApiResponse::error(e.code(), "Temporary service error", None)
            }
            Self::App(e) => ApiResponse::error(e.code(), e.to_string(), None),
            Self::Unauthorized { reason } => ApiResponse::error("UNAUTHORIZED", *reason, None),
            Self::Forbidden { required } => ApiResponse::error(
                "FORBIDDEN",
                format!("Insufficient role. Required: {required}"),
                None,
            ),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::App(e)
    }
}
