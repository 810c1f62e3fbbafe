/// Error types for the dispatch service
///
/// Validation failures are detected before any provider call. Provider
/// failures carry the provider's diagnostic text. Partial batch failures are
/// not errors and never reach this type.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use fcm_shared::FCMError;
use serde::Serialize;
use thiserror::Error;

/// Result type for dispatch-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::Provider(_) => "provider_error",
            AppError::Config(_) | AppError::Internal(_) => "server_error",
        }
    }

    /// Human-readable detail without the variant prefix
    pub fn detail(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::Provider(msg)
            | AppError::Config(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

/// JSON body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub detail: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Provider(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            status: status.as_u16(),
            error: self.error_type().to_string(),
            detail: self.detail().to_string(),
        })
    }
}

impl From<FCMError> for AppError {
    fn from(err: FCMError) -> Self {
        AppError::Provider(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
