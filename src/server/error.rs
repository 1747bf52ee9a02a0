//! Error types for the REST API server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::filter::InvalidFilterError;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Malformed filter selection
    InvalidFilter(String),
    /// Request body missing, not JSON, or not shaped like a selection
    InvalidParameter(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidFilter(msg) => write!(f, "Invalid filter: {}", msg),
            ApiError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Status code and machine-readable kind of the error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidFilter(_) => (StatusCode::BAD_REQUEST, "InvalidFilter"),
            ApiError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, "InvalidParameter"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();
        let message = match self {
            ApiError::InvalidFilter(msg) | ApiError::InvalidParameter(msg) => msg,
        };

        let body = Json(json!({
            "error": error_type,
            "message": message,
        }));

        (status, body).into_response()
    }
}

// Conversions from other error types

impl From<InvalidFilterError> for ApiError {
    fn from(err: InvalidFilterError) -> Self {
        ApiError::InvalidFilter(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidParameter(rejection.body_text())
    }
}
