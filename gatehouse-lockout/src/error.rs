//! Error types and HTTP response conversion

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crate
///
/// The lockout engine itself raises no errors — an active lock is reported
/// as data. These variants exist for the configuration layer and for the
/// enforcement middleware that translates a lock into an HTTP response.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Configuration loaded but failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Attempt blocked by an active lockout
    #[error("Account locked; retry in {retry_after_secs} seconds")]
    AccountLocked {
        /// Seconds until the latest lock expires
        retry_after_secs: u64,
    },

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// HTTP status code
    pub status: u16,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            status: status.as_u16(),
        }
    }

    /// Create error response with a code
    pub fn with_code(
        status: StatusCode,
        code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
            status: status.as_u16(),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::AccountLocked { retry_after_secs } => {
                let body = ErrorResponse::with_code(
                    StatusCode::LOCKED,
                    "ACCOUNT_LOCKED",
                    format!("Account locked. Try again in {} seconds", retry_after_secs),
                );
                let mut response = (StatusCode::LOCKED, Json(body)).into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    response.headers_mut().insert(RETRY_AFTER, value);
                }
                response
            }

            Error::Config(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_code(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_ERROR",
                    e.to_string(),
                )),
            )
                .into_response(),

            Error::InvalidConfig(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_code(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_ERROR",
                    msg,
                )),
            )
                .into_response(),

            Error::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_code(
                    StatusCode::BAD_REQUEST,
                    "BAD_REQUEST",
                    msg,
                )),
            )
                .into_response(),

            Error::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::with_code(
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    msg,
                )),
            )
                .into_response(),

            Error::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::with_code(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "Internal server error",
                    )),
                )
                    .into_response()
            }
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new(StatusCode::NOT_FOUND, "User not found");
        assert_eq!(err.status, 404);
        assert_eq!(err.error, "User not found");
        assert!(err.code.is_none());
    }

    #[test]
    fn test_error_response_with_code() {
        let err = ErrorResponse::with_code(
            StatusCode::BAD_REQUEST,
            "INVALID_EMAIL",
            "Email format is invalid",
        );
        assert_eq!(err.status, 400);
        assert_eq!(err.error, "Email format is invalid");
        assert_eq!(err.code, Some("INVALID_EMAIL".to_string()));
    }

    #[test]
    fn test_account_locked_sets_retry_after() {
        let response = Error::AccountLocked {
            retry_after_secs: 900,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::LOCKED);
        assert_eq!(
            response.headers().get(RETRY_AFTER),
            Some(&HeaderValue::from_static("900"))
        );
    }

    #[test]
    fn test_bad_request_status() {
        let response = Error::BadRequest("missing field".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
