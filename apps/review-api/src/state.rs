//! Application state for the contract review API

use std::sync::Arc;

use anyhow::Result;
use review_engine::{
    AnalysisEngine, ChatQueryEngine, DocumentClassifier, LanguageModel, ModelInvoker,
};
use shared_pdf::TextExtractor;
use sqlx::SqlitePool;

use crate::cache::TemporaryBlobCache;
use crate::config::ServerConfig;
use crate::db;
use crate::presence::{Notifier, PresenceRegistry};
use crate::repository::{ChatRepository, ContractRepository};
use crate::services::{ChatService, ReviewPipeline};

pub struct AppState {
    pub config: ServerConfig,
    pub db: SqlitePool,
    pub blobs: TemporaryBlobCache,
    pub reviews: ContractRepository,
    pub notifier: Arc<Notifier>,
    pub pipeline: ReviewPipeline,
    pub chat: ChatService,
}

impl AppState {
    /// Open the database, run migrations and wire every service.
    pub async fn connect(config: ServerConfig, model: Arc<dyn LanguageModel>) -> Result<Self> {
        let pool = db::connect(&config.database_url).await?;
        Ok(Self::from_parts(
            config,
            pool,
            model,
            TemporaryBlobCache::in_memory(),
        ))
    }

    pub fn from_parts(
        config: ServerConfig,
        db: SqlitePool,
        model: Arc<dyn LanguageModel>,
        blobs: TemporaryBlobCache,
    ) -> Self {
        let invoker = ModelInvoker::new(model, config.ai_timeout);
        let reviews = ContractRepository::new(db.clone());
        let chats = ChatRepository::new(db.clone());
        let notifier = Arc::new(Notifier::new(PresenceRegistry::default()));

        let pipeline = ReviewPipeline::new(
            blobs.clone(),
            TextExtractor::new(),
            DocumentClassifier::new(invoker.clone()),
            AnalysisEngine::new(invoker.clone()),
            reviews.clone(),
            config.classify_blob_ttl,
            config.analyze_blob_ttl,
            config.recitation_retry,
        );
        let chat = ChatService::new(
            reviews.clone(),
            chats,
            ChatQueryEngine::new(invoker),
            Arc::clone(&notifier),
        );

        Self {
            config,
            db,
            blobs,
            reviews,
            notifier,
            pipeline,
            chat,
        }
    }
}
