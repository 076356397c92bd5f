//! Error types for the contract review API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use review_engine::{EngineError, ModelError};
use serde::Serialize;
use shared_pdf::ExtractError;
use thiserror::Error;

use crate::cache::CacheError;
use crate::repository::RepositoryError;
use crate::services::ServiceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload rejected: {0}")]
    PayloadRejected(String),

    #[error("Upload exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Missing user identity")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("Classification failed: {0}")]
    ClassificationFailed(String),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(ModelError),

    #[error("Analysis unrecoverable: {0}")]
    AnalysisUnrecoverable(String),

    #[error("Chat answer unparseable: {0}")]
    ChatAnswerUnparseable(String),

    #[error("Invalid analysis: {0}")]
    InvalidAnalysis(String),

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::PayloadRejected(msg) => {
                (StatusCode::BAD_REQUEST, "PAYLOAD_REJECTED", msg.clone())
            }
            ApiError::PayloadTooLarge(_) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_REJECTED",
                self.to_string(),
            ),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Missing x-user-id header".to_string(),
            ),
            ApiError::Forbidden(_) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access to this contract review is not allowed".to_string(),
            ),
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", format!("{} not found", what))
            }
            ApiError::UnreadableDocument(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNREADABLE_DOCUMENT",
                format!("Could not read the uploaded PDF: {}", msg),
            ),
            ApiError::ClassificationFailed(msg) => {
                tracing::warn!("Classification failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "CLASSIFICATION_FAILED",
                    "Could not determine the contract type".to_string(),
                )
            }
            ApiError::ModelInvocation(e) => {
                tracing::error!("Model invocation failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "MODEL_INVOCATION_ERROR",
                    "The AI service failed to respond".to_string(),
                )
            }
            ApiError::AnalysisUnrecoverable(msg) => {
                tracing::error!("Analysis unrecoverable: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "ANALYSIS_UNRECOVERABLE",
                    "The AI response could not be interpreted".to_string(),
                )
            }
            ApiError::ChatAnswerUnparseable(msg) => {
                tracing::warn!("Chat answer unparseable: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "CHAT_ANSWER_UNPARSEABLE",
                    "The AI answer could not be interpreted".to_string(),
                )
            }
            ApiError::InvalidAnalysis(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_ANALYSIS",
                msg.clone(),
            ),
            ApiError::Persistence(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "Database error".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InsufficientInput(msg) => ApiError::Validation(msg),
            EngineError::ClassificationFailed(msg) => ApiError::ClassificationFailed(msg),
            EngineError::ModelInvocation(e) => ApiError::ModelInvocation(e),
            EngineError::AnalysisUnrecoverable(msg) => ApiError::AnalysisUnrecoverable(msg),
            EngineError::ChatAnswerUnparseable(msg) => ApiError::ChatAnswerUnparseable(msg),
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnreadableDocument(msg) => ApiError::UnreadableDocument(msg),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Invalid(msg) => ApiError::PayloadRejected(msg),
            CacheError::NotFound(key) => ApiError::Internal(format!("staged upload {key} vanished")),
            CacheError::Store(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => ApiError::NotFound(format!("Contract review {id}")),
            RepositoryError::InvalidAnalysis(msg) => ApiError::InvalidAnalysis(msg),
            RepositoryError::Persistence(e) => ApiError::Persistence(e),
            RepositoryError::Corrupt(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Cache(e) => e.into(),
            ServiceError::Extract(e) => e.into(),
            ServiceError::Engine(e) => e.into(),
            ServiceError::Repository(e) => e.into(),
            ServiceError::Forbidden(id) => ApiError::Forbidden(id),
            ServiceError::Task(msg) => ApiError::Internal(msg),
        }
    }
}
