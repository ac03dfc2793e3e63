//! API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use failover_core::GatewayError;
use serde::Serialize;
use tracing::error;

/// Error returned from a handler
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status
    pub status: StatusCode,
    /// Message shown to the caller
    pub message: String,
    /// Set when the quota gate denied the request
    pub quota_exceeded: bool,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    quota_exceeded: bool,
    error: &'a str,
}

impl ApiError {
    /// Create an error with an arbitrary status
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            quota_exceeded: false,
        }
    }

    /// 400
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 403
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 409
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// 429 with the quota marker set
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self {
            quota_exceeded: true,
            ..Self::new(StatusCode::TOO_MANY_REQUESTS, message)
        }
    }

    /// 500
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "Request failed");
        }

        let body = ErrorBody {
            success: false,
            quota_exceeded: self.quota_exceeded,
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        let status =
            StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match error {
            GatewayError::QuotaExceeded { message } => Self::quota_exceeded(message),
            GatewayError::Validation { message, .. } => Self::new(status, message),
            other => Self::new(status, other.to_string()),
        }
    }
}
