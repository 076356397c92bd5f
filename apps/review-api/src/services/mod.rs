//! Request-level workflows composed from the cache, engine and repositories.

mod chat;
mod pipeline;

pub use chat::ChatService;
pub use pipeline::ReviewPipeline;

use review_engine::EngineError;
use shared_pdf::ExtractError;
use thiserror::Error;

use crate::cache::CacheError;
use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Contract review {0} belongs to another user")]
    Forbidden(String),

    #[error("Background task failed: {0}")]
    Task(String),
}
