//! Error types for the review engine

use thiserror::Error;

/// Failure talking to the model provider.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("provider blocked the prompt: {0}")]
    Blocked(String),

    #[error("provider rejected the answer for recitation: {0}")]
    Recitation(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("provider error: {0}")]
    ErrorPreamble(String),

    #[error("malformed provider payload: {0}")]
    Payload(String),

    #[error("model call timed out after {0}ms")]
    Timeout(u64),
}

impl ModelError {
    /// Whether the provider refused to return content it considers recited.
    pub fn is_recitation(&self) -> bool {
        match self {
            ModelError::Recitation(_) => true,
            ModelError::ErrorPreamble(msg) | ModelError::Blocked(msg) => {
                msg.contains("RECITATION")
            }
            _ => false,
        }
    }
}

/// Failure of a classification, analysis or chat operation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Insufficient input: {0}")]
    InsufficientInput(String),

    #[error("Classification failed: {0}")]
    ClassificationFailed(String),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(#[from] ModelError),

    #[error("Analysis unrecoverable: {0}")]
    AnalysisUnrecoverable(String),

    #[error("Chat answer unparseable: {0}")]
    ChatAnswerUnparseable(String),
}
