//! Upload to stored review.
//!
//! Both workflows stage the upload in the blob cache, read it back, extract
//! its text and hand that to the model. The staged blob is released whatever
//! the outcome; if the request is cancelled mid-flight its guard does it.

use std::time::Duration;

use review_engine::{AnalysisEngine, DocumentClassifier, EngineError, RetryPolicy};
use shared_pdf::TextExtractor;
use shared_types::ContractReview;
use tracing::{info, instrument};

use super::ServiceError;
use crate::cache::{StagedBlob, TemporaryBlobCache};
use crate::repository::ContractRepository;

#[derive(Clone)]
pub struct ReviewPipeline {
    blobs: TemporaryBlobCache,
    extractor: TextExtractor,
    classifier: DocumentClassifier,
    analyzer: AnalysisEngine,
    reviews: ContractRepository,
    classify_ttl: Duration,
    analyze_ttl: Duration,
    retry: Option<RetryPolicy>,
}

impl ReviewPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        blobs: TemporaryBlobCache,
        extractor: TextExtractor,
        classifier: DocumentClassifier,
        analyzer: AnalysisEngine,
        reviews: ContractRepository,
        classify_ttl: Duration,
        analyze_ttl: Duration,
        retry: Option<RetryPolicy>,
    ) -> Self {
        Self {
            blobs,
            extractor,
            classifier,
            analyzer,
            reviews,
            classify_ttl,
            analyze_ttl,
            retry,
        }
    }

    /// Guess the contract category of an uploaded PDF.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn detect_category(
        &self,
        owner_id: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ServiceError> {
        let staged = self.blobs.stage(owner_id, bytes, self.classify_ttl).await?;
        let outcome = self.classify_staged(&staged).await;
        staged.release().await;
        outcome
    }

    /// Analyze an uploaded PDF as `category` and store the review.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn review(
        &self,
        owner_id: &str,
        bytes: Vec<u8>,
        category: &str,
    ) -> Result<ContractReview, ServiceError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(EngineError::InsufficientInput(
                "contract category must not be empty".to_string(),
            )
            .into());
        }

        let staged = self.blobs.stage(owner_id, bytes, self.analyze_ttl).await?;
        let outcome = self.review_staged(owner_id, &staged, category).await;
        staged.release().await;

        let review = outcome?;
        info!(
            review_id = %review.id,
            score = review.overall_score,
            items = review.child_item_count(),
            "Contract reviewed"
        );
        Ok(review)
    }

    async fn classify_staged(&self, staged: &StagedBlob) -> Result<String, ServiceError> {
        let text = self.extract(staged).await?;
        Ok(self.classifier.classify(&text).await?)
    }

    async fn review_staged(
        &self,
        owner_id: &str,
        staged: &StagedBlob,
        category: &str,
    ) -> Result<ContractReview, ServiceError> {
        let text = self.extract(staged).await?;
        let analysis = match &self.retry {
            Some(policy) => self.analyzer.analyze_with_retry(&text, category, policy).await?,
            None => self.analyzer.analyze(&text, category).await?,
        };

        let review = self
            .reviews
            .persist(owner_id, &text, category, &analysis, self.analyzer.model_name())
            .await?;
        Ok(review)
    }

    async fn extract(&self, staged: &StagedBlob) -> Result<String, ServiceError> {
        let bytes = staged.fetch().await?;
        let extractor = self.extractor;
        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| ServiceError::Task(e.to_string()))??;
        Ok(text)
    }
}
