use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::backend::BackendError;
use crate::drafts::DraftError;
use crate::wizard::WizardError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Draft store error: {0}")]
    Draft(#[from] DraftError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = Value::Null;

        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Wizard(WizardError::Validation(report)) => {
                details = json!(report.fields);
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    self.to_string(),
                )
            }
            AppError::Wizard(WizardError::MissingOrganization) => (
                StatusCode::BAD_REQUEST,
                "MISSING_ORGANIZATION",
                self.to_string(),
            ),
            AppError::Wizard(WizardError::Submission { message }) => (
                StatusCode::BAD_GATEWAY,
                "SUBMISSION_ERROR",
                message.clone(),
            ),
            AppError::Backend(e) => {
                tracing::error!("Backend error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_ERROR",
                    "The upstream service could not be reached".to_string(),
                )
            }
            AppError::Draft(e) => {
                tracing::error!("Draft store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DRAFT_ERROR",
                    "A local storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if !details.is_null() {
            error["fields"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
