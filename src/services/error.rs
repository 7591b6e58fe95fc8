use crate::store::StoreError;
use crate::ApiError;
use crate::ErrorDetail;
use rocket::serde::json::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Gone(String),
    #[error("{0}")]
    InternalError(String),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{} not found", what))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound("Record not found".to_string()),
            StoreError::Conflict(detail) => ServiceError::Conflict(detail),
            StoreError::Backend(detail) => {
                tracing::error!(error = %detail, "storage backend failure");
                ServiceError::InternalError("Storage failure".to_string())
            }
        }
    }
}

impl From<bcrypt::BcryptError> for ServiceError {
    fn from(err: bcrypt::BcryptError) -> Self {
        tracing::error!(error = %err, "password hashing failed");
        ServiceError::InternalError("Password hashing failed".to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(detail) => ApiError::NotFound(Json(ErrorDetail { error: detail })),
            ServiceError::Unauthorized(detail) => ApiError::Unauthorized(Json(ErrorDetail { error: detail })),
            ServiceError::Forbidden(detail) => ApiError::Forbidden(Json(ErrorDetail { error: detail })),
            ServiceError::Conflict(detail) => ApiError::Conflict(Json(ErrorDetail { error: detail })),
            ServiceError::InvalidInput(detail) => ApiError::InvalidInput(Json(ErrorDetail { error: detail })),
            ServiceError::Gone(detail) => ApiError::Gone(Json(ErrorDetail { error: detail })),
            ServiceError::InternalError(detail) => ApiError::InternalError(Json(ErrorDetail { error: detail })),
        }
    }
}
