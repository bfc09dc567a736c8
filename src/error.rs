//! Error types for Keyhole
//!
//! Every failure inside a request is converted into an HTTP response at the
//! handler boundary. Bodies use the minimal shape the browser client expects:
//! `{"status": "error", "message": "..."}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimitExceeded { limit: u32, retry_after_secs: u64 },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request to upstream API timed out after {timeout:?}")]
    UpstreamTimeout { timeout: Duration },

    #[error("{0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Outcome label used for metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::RateLimitExceeded { .. } => "rate_limited",
            AppError::BadRequest(_) => "bad_request",
            AppError::UpstreamTimeout { .. } => "timeout",
            AppError::Upstream(_) => "upstream_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(self.to_string());
        let mut response = (status, Json(body)).into_response();

        if let AppError::RateLimitExceeded {
            limit,
            retry_after_secs,
        } = self
        {
            let headers = response.headers_mut();
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            headers.insert(
                header::HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(limit),
            );
            headers.insert(
                header::HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from(0u32),
            );
        }

        response
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
