use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::services::scorer::ScorerError;

pub type Result<T> = std::result::Result<T, AppError>;

/// Errors surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed request field
    #[error("{0}")]
    Validation(String),

    /// The model failed to load at startup
    #[error("{0}")]
    ModelUnavailable(String),

    #[error("{message}")]
    NotFound { message: String, details: String },

    /// The posts API failed or returned something unusable
    #[error("{message}")]
    UpstreamFetch { message: String, details: String },

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn model_unavailable() -> Self {
        AppError::ModelUnavailable("Model not available".to_string())
    }

    fn details(&self) -> Option<String> {
        match self {
            AppError::NotFound { details, .. } | AppError::UpstreamFetch { details, .. } => {
                Some(details.clone())
            }
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ModelUnavailable(_)
            | AppError::UpstreamFetch { .. }
            | AppError::Analysis(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(_) | AppError::NotFound { .. } => {
                tracing::debug!(error = %self, details = ?self.details(), "Request rejected");
            }
            _ => {
                tracing::error!(error = %self, details = ?self.details(), "Request failed");
            }
        }

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            details: self.details(),
        })
    }
}

impl From<ScorerError> for AppError {
    fn from(err: ScorerError) -> Self {
        match err {
            ScorerError::Unavailable => AppError::model_unavailable(),
            other => AppError::Analysis(other.to_string()),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(format!("Inference task failed: {}", err))
    }
}
