//! Error handling for the Meal Program Cost Engine
//!
//! Provides consistent error responses in English and Indonesian

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::CostError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_local: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Costing errors
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Computation error: {0}")]
    Computation(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<CostError> for AppError {
    fn from(err: CostError) -> Self {
        match err {
            CostError::NotFound { entity, id } => AppError::NotFound(format!("{} {}", entity, id)),
            CostError::InvalidState(msg) => AppError::InvalidState(msg),
            CostError::Computation(msg) => AppError::Computation(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_local: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Shorthand for a missing or foreign-tenant entity
    pub fn not_found(entity: &str, id: uuid::Uuid) -> Self {
        AppError::NotFound(format!("{} {}", entity, id))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AppError::Validation { .. } | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Computation(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_detail = match &self {
            AppError::InvalidToken => ErrorDetail {
                code: "INVALID_TOKEN".to_string(),
                message_en: "Invalid token".to_string(),
                message_local: "Token tidak valid".to_string(),
                field: None,
            },
            AppError::InsufficientPermissions => ErrorDetail {
                code: "INSUFFICIENT_PERMISSIONS".to_string(),
                message_en: "You do not have permission to perform this action".to_string(),
                message_local: "Anda tidak memiliki izin untuk melakukan tindakan ini".to_string(),
                field: None,
            },
            AppError::Validation { field, message, message_local } => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message_en: message.clone(),
                message_local: message_local.clone(),
                field: Some(field.clone()),
            },
            AppError::ValidationError(msg) => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message_en: msg.clone(),
                message_local: format!("Data tidak valid: {}", msg),
                field: None,
            },
            AppError::NotFound(resource) => ErrorDetail {
                code: "NOT_FOUND".to_string(),
                message_en: format!("{} not found", resource),
                message_local: format!("{} tidak ditemukan", resource),
                field: None,
            },
            AppError::InvalidState(msg) => ErrorDetail {
                code: "INVALID_STATE".to_string(),
                message_en: msg.clone(),
                message_local: format!("Status data tidak valid: {}", msg),
                field: None,
            },
            AppError::Computation(msg) => ErrorDetail {
                code: "COMPUTATION_ERROR".to_string(),
                message_en: msg.clone(),
                message_local: "Terjadi kesalahan perhitungan biaya".to_string(),
                field: None,
            },
            AppError::DatabaseError(_) => ErrorDetail {
                code: "DATABASE_ERROR".to_string(),
                message_en: "A database error occurred".to_string(),
                message_local: "Terjadi kesalahan pada basis data".to_string(),
                field: None,
            },
            AppError::Internal(msg) => ErrorDetail {
                code: "INTERNAL_ERROR".to_string(),
                message_en: msg.clone(),
                message_local: "Terjadi kesalahan internal pada server".to_string(),
                field: None,
            },
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_cost_errors_map_to_status_codes() {
        let id = Uuid::new_v4();
        assert_eq!(
            AppError::from(CostError::not_found("Production batch", id)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(CostError::InvalidState("no batch".into())).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(CostError::Computation("overflow".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
