use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::intake::dispatch::DispatchError;
use crate::intake::staging::AttachmentRejection;

pub const NOT_CONFIGURED_MESSAGE: &str =
    "Email service not configured. Please contact administrator.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant renders as `{ "success": false, "message": ... }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Attachment rejected: {0}")]
    AttachmentRejected(#[from] AttachmentRejection),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Mail credentials are not configured")]
    Configuration,

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::AttachmentRejected(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Configuration | AppError::Dispatch(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message shown to the applicant.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::AttachmentRejected(rejection) => rejection.to_string(),
            AppError::Configuration => NOT_CONFIGURED_MESSAGE.to_string(),
            AppError::Dispatch(e) => e.user_message(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Validation(msg) | AppError::BadRequest(msg) => {
                tracing::warn!("Rejected submission: {msg}");
            }
            AppError::AttachmentRejected(rejection) => {
                tracing::warn!("Rejected attachment: {rejection:?}");
            }
            AppError::Configuration => {
                tracing::error!("SMTP credentials not configured");
            }
            AppError::Dispatch(e) => {
                tracing::error!("Dispatch error: {e}");
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
            }
        }

        let body = Json(json!({
            "success": false,
            "message": self.user_message(),
        }));

        (self.status(), body).into_response()
    }
}
