//! Error types for draftline
//!
//! This module provides the error taxonomy for the library:
//! - Pipeline errors (transport, parse, validation, configuration)
//! - Storage substrate errors (SQLite)
//! - HTTP status code mapping and structured error bodies for the proxy API

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for draftline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for draftline
///
/// Messages produced by `Display` are safe to show to an end user: raw model
/// output never appears in them (it is logged where the failure happens).
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration (e.g. an absent API key)
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "openai.api_key")
        key: Option<String>,
    },

    /// Input rejected before any provider call (empty topic, missing field)
    #[error("validation error: {0}")]
    Validation(String),

    /// Model response could not be decoded into the expected structure
    #[error("could not parse the model response: {0}")]
    Parse(String),

    /// Provider call failed below the HTTP layer or mid-stream
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP client error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("provider returned {status}: {message}")]
    Provider {
        /// HTTP status returned by the provider
        status: u16,
        /// Error message extracted from the provider response
        message: String,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Saved record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether this error came from talking to a model provider
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Network(_) | Error::Provider { .. }
        )
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "validation_error",
///     "message": "validation error: prompt is required"
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
    /// Machine-readable error code (e.g., "validation_error", "provider_error")
    pub code: String,

    /// Human-readable error message
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
            // 400 Bad Request - caller sent something unusable
            Error::Validation(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 500 Internal Server Error - the server itself is misconfigured or broken
            Error::Config { .. } => 500,
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - upstream model provider failed
            Error::Parse(_) => 502,
            Error::Transport(_) => 502,
            Error::Network(_) => 502,
            Error::Provider { .. } => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Parse(_) => "parse_error",
            Error::Transport(_) => "transport_error",
            Error::Network(_) => "network_error",
            Error::Provider { .. } => "provider_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::NotFound(_) => "not_found",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Provider { status, .. } => Some(serde_json::json!({
                "upstream_status": status,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (Error::config("missing key", "openai.api_key"), 500, "config_error"),
            (Error::Validation("empty topic".into()), 400, "validation_error"),
            (Error::Parse("expected value".into()), 502, "parse_error"),
            (Error::Transport("stream closed".into()), 502, "transport_error"),
            (
                Error::Provider {
                    status: 429,
                    message: "rate limited".into(),
                },
                502,
                "provider_error",
            ),
            (
                Error::Database(DatabaseError::QueryFailed("locked".into())),
                500,
                "database_error",
            ),
            (
                Error::Io(std::io::Error::other("disk gone")),
                500,
                "io_error",
            ),
            (
                Error::Serialization(serde_json::from_str::<u8>("x").unwrap_err()),
                500,
                "serialization_error",
            ),
            (Error::NotFound("outline abc".into()), 404, "not_found"),
            (Error::ApiServerError("bind".into()), 500, "api_server_error"),
            (Error::Other("boom".into()), 500, "internal_error"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_and_code() {
        for (error, status, code) in all_error_variants() {
            assert_eq!(error.status_code(), status, "{error:?} status");
            assert_eq!(error.error_code(), code, "{error:?} code");
        }
    }

    #[test]
    fn validation_is_client_error_but_parse_is_upstream_error() {
        assert_eq!(Error::Validation("x".into()).status_code(), 400);
        assert_eq!(
            Error::Parse("x".into()).status_code(),
            502,
            "a malformed model response is the provider's fault, not the caller's"
        );
    }

    #[test]
    fn transport_classification() {
        assert!(Error::Transport("x".into()).is_transport());
        assert!(
            Error::Provider {
                status: 500,
                message: "x".into()
            }
            .is_transport()
        );
        assert!(!Error::Parse("x".into()).is_transport());
        assert!(!Error::Validation("x".into()).is_transport());
    }

    #[test]
    fn api_error_from_config_carries_key() {
        let api_error: ApiError = Error::config("missing", "openai.api_key").into();
        assert_eq!(api_error.error.code, "config_error");
        assert_eq!(api_error.error.details.unwrap()["key"], "openai.api_key");
    }

    #[test]
    fn api_error_from_provider_carries_upstream_status() {
        let api_error: ApiError = Error::Provider {
            status: 503,
            message: "overloaded".into(),
        }
        .into();
        assert_eq!(api_error.error.code, "provider_error");
        assert!(api_error.error.message.contains("overloaded"));
        assert_eq!(api_error.error.details.unwrap()["upstream_status"], 503);
    }

    #[test]
    fn api_error_from_validation_has_no_details() {
        let api_error: ApiError = Error::Validation("prompt is required".into()).into();
        assert!(api_error.error.details.is_none());
        let json = serde_json::to_value(&api_error).unwrap();
        assert!(
            json["error"].get("details").is_none(),
            "absent details must be omitted from the JSON body"
        );
    }
}
