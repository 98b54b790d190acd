use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use shared_types::{ErrorResponse, ValidationIssue};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Submission rejected with {} issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StorageFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let issues = match self {
            AppError::Validation(issues) => issues.clone(),
            _ => Vec::new(),
        };

        let error_response = ErrorResponse {
            error: self.error_type(),
            message: self.to_string(),
            issues,
        };

        HttpResponse::build(self.status_code()).json(error_response)
    }
}

impl AppError {
    pub fn error_type(&self) -> String {
        match self {
            AppError::Database(_) => "database_error".to_string(),
            AppError::Config(_) => "config_error".to_string(),
            AppError::Io(_) => "io_error".to_string(),
            AppError::NotFound(_) => "not_found".to_string(),
            AppError::AccessDenied(_) => "access_denied".to_string(),
            AppError::Unauthorized(_) => "unauthorized".to_string(),
            AppError::InvalidRequest(_) => "invalid_request".to_string(),
            AppError::Validation(_) => "validation_failed".to_string(),
            AppError::Conflict(_) => "conflict".to_string(),
            AppError::StorageFailure(_) => "storage_failure".to_string(),
            AppError::Internal(_) => "internal_error".to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
