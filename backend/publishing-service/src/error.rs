/// Error types for publishing-service
///
/// Errors are converted to the shared JSON error body for API clients.
/// Platform failures during a publishing cycle are recorded on the post
/// and never surface here.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use error_types::{error_codes, error_types as kinds, ErrorResponse};
use thiserror::Error;

/// Result type for publishing-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt post record: {0}")]
    CorruptRecord(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::CorruptRecord(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error_type, code) = match self {
            AppError::Database(_) => (kinds::SERVER, error_codes::DATABASE_ERROR),
            AppError::CorruptRecord(_) | AppError::Internal(_) => {
                (kinds::SERVER, error_codes::INTERNAL_SERVER_ERROR)
            }
            AppError::Validation(_) => (kinds::VALIDATION, error_codes::VALIDATION_ERROR),
            AppError::BadRequest(_) => (kinds::VALIDATION, error_codes::INVALID_REQUEST),
            AppError::NotFound(_) => (kinds::NOT_FOUND, error_codes::POST_NOT_FOUND),
            AppError::Conflict(_) => (kinds::CONFLICT, error_codes::POST_NOT_CANCELLABLE),
            AppError::Unauthorized(_) => (kinds::AUTHENTICATION, error_codes::UNAUTHORIZED),
        };

        let body = ErrorResponse::for_status(status.as_u16(), &self.to_string(), error_type, code);
        HttpResponse::build(status).json(body)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
