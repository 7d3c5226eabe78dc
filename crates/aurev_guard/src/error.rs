//! Error types for the AUREV Guard API server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::middleware::current_request_id;

/// A specialized `Result` type for AUREV Guard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type for the AUREV Guard server.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field was missing or a value was malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The operation requires an on-chain payment that was not supplied.
    #[error("{0}")]
    PaymentRequired(String),

    /// The requested decision bundle, job or history was not found.
    #[error("{0}")]
    NotFound(String),

    /// The request conflicts with state already recorded.
    #[error("{0}")]
    Conflict(String),

    /// A sibling service could not be reached or returned garbage.
    #[error("{service} unavailable: {message}")]
    Upstream { service: String, message: String },

    /// A sibling service answered with a non-success status.
    #[error("{service} returned {status}: {body}")]
    UpstreamStatus {
        service: String,
        status: u16,
        body: String,
    },

    /// An operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The server is missing configuration needed for the operation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An unexpected internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// An error from the underlying I/O system.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Data could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// The standard JSON body for an API error.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// A human-readable error message.
    pub error: String,
    /// A machine-readable error code string.
    pub code: String,
    /// The id of the request that failed, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Error {
    /// Shorthand for a transport-level failure talking to `service`.
    pub fn upstream(service: impl Into<String>, message: impl ToString) -> Self {
        Error::Upstream {
            service: service.into(),
            message: message.to_string(),
        }
    }

    /// Returns `true` when a sibling service rejected the request itself (4xx).
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, Error::UpstreamStatus { status, .. } if (400..500).contains(status))
    }

    /// Returns the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Error::UpstreamStatus { .. } => StatusCode::BAD_GATEWAY,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a machine-readable error code string for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "BAD_REQUEST",
            Error::PaymentRequired(_) => "PAYMENT_REQUIRED",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Conflict(_) => "CONFLICT",
            Error::Upstream { .. } => "UPSTREAM_UNAVAILABLE",
            Error::UpstreamStatus { .. } => "UPSTREAM_ERROR",
            Error::Timeout(_) => "TIMEOUT",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        }
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: self.error_code().to_string(),
            request_id: current_request_id(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for Error {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::BadRequest("address is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound("Decision not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::PaymentRequired("Payment required".into()).status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            Error::upstream("orchestrator", "connection refused").status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_client_rejection() {
        let rejected = Error::UpstreamStatus {
            service: "orchestrator".into(),
            status: 422,
            body: "bad workflow".into(),
        };
        assert!(rejected.is_client_rejection());

        let failed = Error::UpstreamStatus {
            service: "orchestrator".into(),
            status: 503,
            body: String::new(),
        };
        assert!(!failed.is_client_rejection());
        assert!(!Error::Timeout("x".into()).is_client_rejection());
    }

    #[test]
    fn test_error_display() {
        let err = Error::upstream("ai-model", "connection refused");
        assert_eq!(err.to_string(), "ai-model unavailable: connection refused");
        assert_eq!(
            Error::BadRequest("walletAddress is required".into()).to_string(),
            "walletAddress is required"
        );
    }
}
