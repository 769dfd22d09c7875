//! Error types for vidfetch
//!
//! This module provides the error taxonomy for the library, including:
//! - Domain-specific error classes (validation, auth, transient network, storage)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for vidfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vidfetch
///
/// Each variant corresponds to one failure class with a distinct retry and
/// HTTP-mapping behavior. Download-job failures are captured into the job
/// record; they never cross the accept-path boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unsupported URL; surfaced immediately, never retried
    #[error("invalid URL: {0}")]
    Validation(String),

    /// Upstream blocks automated access (bot detection)
    #[error("{0}. Export a cookies.txt into the storage directory to authenticate")]
    AuthRequired(String),

    /// Connection/timeout class failure; retried with backoff by the job runner
    #[error("network failure: {0}")]
    TransientNetwork(String),

    /// Failed to create directory, write, or rename an artifact
    #[error("storage error: {0}")]
    Storage(String),

    /// Unknown job id or missing artifact file at serve time
    #[error("{0} not found")]
    NotFound(String),

    /// Extractor binary missing or exited abnormally
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error from the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServer(String),

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,
}

/// API error response format
///
/// Returned by API endpoints when an error occurs, with a machine-readable
/// code, a human-readable message, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "download 3f2a... not found"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message, suitable for displaying to end users
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Validation(_) => 400,

            // 403 Forbidden - upstream refuses automated access
            Error::AuthRequired(_) => 403,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 500 Internal Server Error - Server-side issues
            Error::Storage(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServer(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::TransientNetwork(_) => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ExternalTool(_) => 503,
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::AuthRequired(_) => "auth_required",
            Error::TransientNetwork(_) => "transient_network_error",
            Error::Storage(_) => "storage_error",
            Error::NotFound(_) => "not_found",
            Error::ExternalTool(_) => "external_tool_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServer(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError::new(error.error_code().to_string(), error.to_string())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a vec of (Error, expected_status_code, expected_error_code) for
    /// every reachable match arm in ToHttpStatus.
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Validation("not a URL".into()),
                400,
                "validation_error",
            ),
            (
                Error::AuthRequired("sign-in required".into()),
                403,
                "auth_required",
            ),
            (
                Error::TransientNetwork("connection reset".into()),
                502,
                "transient_network_error",
            ),
            (
                Error::Storage("rename failed".into()),
                500,
                "storage_error",
            ),
            (Error::NotFound("download 99".into()), 404, "not_found"),
            (
                Error::ExternalTool("yt-dlp not found".into()),
                503,
                "external_tool_error",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServer("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::ShuttingDown, 503, "shutting_down"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_status = error.status_code();
            assert_eq!(
                actual_status, expected_status,
                "Error variant with error_code={expected_code} returned status {actual_status}, expected {expected_status}"
            );
        }
    }

    #[test]
    fn every_variant_maps_to_expected_error_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_code = error.error_code();
            assert_eq!(
                actual_code, expected_code,
                "Error variant with expected status={expected_status} returned error_code={actual_code}, expected {expected_code}"
            );
        }
    }

    #[test]
    fn validation_is_400_not_500() {
        assert_eq!(Error::Validation("bad".into()).status_code(), 400);
    }

    #[test]
    fn transient_network_is_502_bad_gateway() {
        assert_eq!(Error::TransientNetwork("timeout".into()).status_code(), 502);
    }

    #[test]
    fn auth_required_message_contains_guidance() {
        let err = Error::AuthRequired("YouTube bot detection".into());
        let msg = err.to_string();
        assert!(msg.contains("YouTube bot detection"));
        assert!(
            msg.contains("cookies.txt"),
            "auth errors must carry actionable guidance, got: {msg}"
        );
    }

    #[test]
    fn api_error_message_matches_error_display() {
        let err = Error::Storage("disk full".into());
        let display_msg = err.to_string();
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "storage_error");
        assert_eq!(api.error.message, display_msg);
        assert!(api.error.details.is_none());
    }

    #[test]
    fn api_error_not_found_factory() {
        let api = ApiError::not_found("download 123");

        assert_eq!(api.error.code, "not_found");
        assert_eq!(api.error.message, "download 123 not found");
        assert!(api.error.details.is_none());
    }

    #[test]
    fn api_error_validation_factory() {
        let api = ApiError::validation("url is required");

        assert_eq!(api.error.code, "validation_error");
        assert_eq!(api.error.message, "url is required");
    }

    #[test]
    fn api_error_without_details_omits_details_in_json() {
        let api = ApiError::new("test_code", "test message");

        let json_str = serde_json::to_string(&api).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(parsed["error"]["code"], "test_code");
        assert_eq!(parsed["error"]["message"], "test message");
        assert!(
            parsed["error"].get("details").is_none(),
            "details field should be omitted from JSON when None"
        );
    }

    #[test]
    fn with_details_preserves_json_object() {
        let details = serde_json::json!({"download_id": "abc", "attempts": 3});
        let api = ApiError::with_details("custom_error", "something broke", details.clone());

        assert_eq!(api.error.code, "custom_error");
        assert_eq!(api.error.details.unwrap(), details);
    }
}
