//! Error handling for the roastery inventory backend
//!
//! Provides consistent error responses in Arabic and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::LedgerViolation;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_ar: String,
    },

    #[error("Insufficient inventory: {message}")]
    InsufficientInventory {
        field: String,
        message: String,
        message_ar: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// A conditional write found the row changed since the snapshot
    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_ar: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Conflict raised when `resource` no longer matches the snapshot it was planned on
    pub fn stale(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        AppError::Conflict {
            message: format!("{} was changed by another operation; nothing was saved", resource),
            message_ar: "تم تعديل البيانات من عملية أخرى، لم يتم حفظ أي شيء. أعد المحاولة.".to_string(),
            resource,
        }
    }

    /// Whether the request was rejected before anything was written
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. } | AppError::InsufficientInventory { .. }
        )
    }
}

impl From<LedgerViolation> for AppError {
    fn from(violation: LedgerViolation) -> Self {
        let field = violation.field().to_string();
        let message = violation.to_string();
        let message_ar = violation.message_ar();
        if violation.is_shortfall() {
            AppError::InsufficientInventory {
                field,
                message,
                message_ar,
            }
        } else {
            AppError::Validation {
                field,
                message,
                message_ar,
            }
        }
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
    pub message_ar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_ar,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_ar: message_ar.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::InsufficientInventory {
                field,
                message,
                message_ar,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_INVENTORY".to_string(),
                    message_en: message.clone(),
                    message_ar: message_ar.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_ar: format!("لم يتم العثور على {}", resource),
                    field: None,
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message_en: format!("A record with this {} already exists", field),
                    message_ar: format!("يوجد سجل بنفس {} مسبقاً", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::Conflict {
                resource,
                message,
                message_ar,
            } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message_en: message.clone(),
                    message_ar: message_ar.clone(),
                    field: Some(resource.clone()),
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message_en: format!("Configuration error: {}", msg),
                    message_ar: format!("خطأ في الإعدادات: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_ar: "حدث خطأ في قاعدة البيانات".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_ar: "حدث خطأ داخلي في الخادم".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_ar: "حدث خطأ داخلي في الخادم".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_shortfalls_map_to_insufficient_inventory() {
        let err: AppError = LedgerViolation::InsufficientBags {
            bean_type: "يمني".to_string(),
            requested: 3,
            available: 1,
        }
        .into();
        assert!(matches!(err, AppError::InsufficientInventory { ref field, .. } if field == "count"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_rule_breaks_map_to_validation() {
        let err: AppError = LedgerViolation::OutputExceedsInput {
            input_kg: Decimal::from(10),
            output_kg: Decimal::from(11),
            reprocessed_kg: Decimal::ZERO,
        }
        .into();
        match err {
            AppError::Validation { field, message_ar, .. } => {
                assert_eq!(field, "outputs");
                assert!(!message_ar.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (
                AppError::from(LedgerViolation::UnknownBeanType("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(LedgerViolation::AllocationExceeded {
                    roast_type: "سلطان وسط".into(),
                    requested_kg: Decimal::ONE,
                    available_kg: Decimal::ZERO,
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::NotFound("Batch".into()), StatusCode::NOT_FOUND),
            (AppError::DuplicateEntry("bag_code".into()), StatusCode::CONFLICT),
            (AppError::stale("Bag"), StatusCode::CONFLICT),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
