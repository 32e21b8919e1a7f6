//! Error Handling Module
//!
//! Maps service failures onto HTTP status codes with a uniform JSON body.
//! Uses thiserror for the enum and tracing for the server-side detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::ShopError;

/// API error type
///
/// # Design Decision
///
/// Every variant maps to exactly one status code:
/// - client errors: 4xx (bad input, missing token, foreign user id, full slot)
/// - server errors: 5xx (store, timeout, internal)
///
/// 5xx bodies stay generic. The cause is only logged.
#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 400 Bad Request ============
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ============ 401 Unauthorized ============
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // ============ 403 Forbidden ============
    #[error("Forbidden")]
    Forbidden,

    // ============ 404 Not Found ============
    #[error("Resource not found: {0}")]
    NotFound(String),

    // ============ 409 Conflict ============
    #[error("Conflict: {0}")]
    Conflict(String),

    // ============ 500 Internal Server Error ============
    #[error("{message}")]
    OperationFailed { code: &'static str, message: String },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Internal server error")]
    InternalError,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::OperationFailed { .. }
            | ApiError::DatabaseError(_)
            | ApiError::Timeout
            | ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details) = match &self {
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg.clone(), None),
            ApiError::ValidationError(msg) => (
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                Some(msg.clone()),
            ),
            ApiError::Unauthorized(msg) => ("UNAUTHORIZED", msg.clone(), None),
            ApiError::Forbidden => (
                "FORBIDDEN",
                "token does not belong to this user".to_string(),
                None,
            ),
            ApiError::NotFound(msg) => ("NOT_FOUND", msg.clone(), None),
            ApiError::Conflict(msg) => ("CONFLICT", msg.clone(), None),

            ApiError::OperationFailed { code, message } => {
                tracing::error!(code, "operation failed: {:?}", self);
                (*code, message.clone(), None)
            }
            ApiError::DatabaseError(_) => {
                tracing::error!("Database error: {:?}", self);
                (
                    "DATABASE_ERROR",
                    "Database error occurred".to_string(),
                    None,
                )
            }
            ApiError::Timeout => {
                tracing::error!("request deadline exceeded");
                ("TIMEOUT", "Request timed out".to_string(), None)
            }
            ApiError::InternalError => (
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        let message = err.to_string();
        match err {
            ShopError::UserNotValid | ShopError::ProductNotValid | ShopError::InvalidQuery => {
                ApiError::BadRequest(message)
            }
            ShopError::Validation(msg) => ApiError::ValidationError(msg),
            ShopError::EmailTaken | ShopError::PhoneTaken | ShopError::EmptyCart => {
                ApiError::BadRequest(message)
            }

            ShopError::ProductNotFound | ShopError::UserNotFound | ShopError::AddressNotFound(_) => {
                ApiError::NotFound(message)
            }

            ShopError::InvalidCredentials => ApiError::Unauthorized(message),

            ShopError::TooManyAddresses | ShopError::SlotTaken(_) => ApiError::Conflict(message),

            ShopError::CartUpdateFailed(source) => {
                tracing::error!(error = ?source, "cart update failed");
                ApiError::OperationFailed {
                    code: "CART_UPDATE_FAILED",
                    message,
                }
            }
            ShopError::RemoveFailed(source) => {
                tracing::error!(error = ?source, "cart remove failed");
                ApiError::OperationFailed {
                    code: "REMOVE_FAILED",
                    message,
                }
            }
            ShopError::BuyFailed(source) => {
                tracing::error!(error = ?source, "checkout failed");
                ApiError::OperationFailed {
                    code: "BUY_FAILED",
                    message,
                }
            }

            ShopError::Store(source) => ApiError::DatabaseError(source.to_string()),
            ShopError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ApiError::InternalError
            }
        }
    }
}
