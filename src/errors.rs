// src/errors.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Resource not found")]
    NotFound,

    #[error("Validation errors")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::SqlxError(sqlx_error) => {
                tracing::error!("SQLx error: {:?}", sqlx_error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "حدث خطأ داخلي في الخادم (قاعدة البيانات)".to_string(),
                )
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "العنصر المطلوب غير موجود".to_string()),
            AppError::ValidationError(errors) => {
                let mut messages = Vec::new();
                for (field, field_errors) in errors.field_errors() {
                    for error in field_errors {
                        let msg = error.message.as_ref().map_or_else(
                            || format!("الحقل '{}' غير صالح", field),
                            |m| format!("الحقل '{}': {}", field, m),
                        );
                        messages.push(msg);
                    }
                }
                (StatusCode::UNPROCESSABLE_ENTITY, messages.join("; "))
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Config(message) => {
                tracing::error!("Configuration error surfaced to a request: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "حدث خطأ داخلي في الخادم".to_string(),
                )
            }
            AppError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "حدث خطأ داخلي في الخادم".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
