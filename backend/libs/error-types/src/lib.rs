//! Shared error response format for the artist portal backend services.
//!
//! Every service renders failures as an [`ErrorResponse`] so that the portal
//! client can route on `error_type` and `code` regardless of which service
//! answered.

use serde::{Deserialize, Serialize};

/// Unified API error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short reason phrase ("Not Found", "Bad Request", ...)
    pub error: String,

    /// Human readable message
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Error category, one of the constants in [`error_types`]
    pub error_type: String,

    /// Machine readable code, one of the constants in [`error_codes`]
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Build a response whose `error` field is the reason phrase of `status`.
    pub fn for_status(status: u16, message: &str, error_type: &str, code: &str) -> Self {
        Self::new(reason_phrase(status), message, status, error_type, code)
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

/// Reason phrase for the status codes the services emit.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Error",
    }
}

pub mod error_types {
    pub const VALIDATION: &str = "validation_error";
    pub const AUTHENTICATION: &str = "authentication_error";
    pub const NOT_FOUND: &str = "not_found_error";
    pub const CONFLICT: &str = "conflict_error";
    pub const UPSTREAM: &str = "upstream_error";
    pub const SERVER: &str = "server_error";
}

pub mod error_codes {
    // Generic
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

    // Live streams
    pub const STREAM_NOT_FOUND: &str = "STREAM_NOT_FOUND";
    pub const INVALID_WEBHOOK_SIGNATURE: &str = "INVALID_WEBHOOK_SIGNATURE";
    pub const PROVIDER_ERROR: &str = "PROVIDER_ERROR";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";

    // Scheduled posts
    pub const POST_NOT_FOUND: &str = "POST_NOT_FOUND";
    pub const POST_NOT_CANCELLABLE: &str = "POST_NOT_CANCELLABLE";
}
