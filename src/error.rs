use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::mood::EntryError;
use crate::store::StoreError;

pub const TRANSIENT_FAILURE: &str =
    "The mood sheet is temporarily unavailable. Please try again in a moment.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] EntryError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidInput(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the person using the dashboard.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::RateLimited => "Too many submissions, slow down a little.".into(),
            AppError::Store(_) => TRANSIENT_FAILURE.into(),
            AppError::Internal(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store error");
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
            }
            AppError::Validation(_) | AppError::InvalidInput(_) => {
                tracing::debug!(error = %self, "Rejected submission");
            }
            AppError::RateLimited => {}
        }

        let status = self.status();
        let body = json!({
            "error": {
                "message": self.user_message(),
                "code": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
