//! Durable storage for reviews and their chat history.

mod chats;
mod reviews;

pub use chats::ChatRepository;
pub use reviews::{ContractRepository, ReviewContext};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Contract review not found: {0}")]
    NotFound(String),

    #[error("Invalid analysis: {0}")]
    InvalidAnalysis(String),

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Corrupt stored value: {0}")]
    Corrupt(#[from] serde_json::Error),
}
