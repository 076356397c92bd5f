//! Full contract analysis.
//!
//! One model call per analysis. A response that is "almost" right is
//! recovered by the [`cascade`](crate::cascade) instead of paying for
//! another call; [`AnalysisEngine::analyze_with_retry`] exists for
//! deployments that want to re-ask after a recitation rejection.

use shared_types::AnalysisResult;
use tracing::{info, instrument};

use crate::cascade::parse_analysis;
use crate::error::EngineError;
use crate::model::ModelInvoker;
use crate::prompts;
use crate::retry::{retry_on_recitation, RetryPolicy};

/// Shortest contract text worth analyzing, in characters.
pub const MIN_TEXT_CHARS: usize = 200;

#[derive(Clone)]
pub struct AnalysisEngine {
    invoker: ModelInvoker,
}

impl AnalysisEngine {
    pub fn new(invoker: ModelInvoker) -> Self {
        Self { invoker }
    }

    /// Identifier of the model producing analyses.
    pub fn model_name(&self) -> &str {
        self.invoker.model_name()
    }

    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn analyze(&self, text: &str, category: &str) -> Result<AnalysisResult, EngineError> {
        let prompt = Self::prompt_for(text, category)?;
        let raw = self.invoker.invoke(&prompt).await?;
        Self::interpret(&raw)
    }

    /// Like [`analyze`](Self::analyze), re-invoking on recitation rejections.
    #[instrument(skip(self, text, policy), fields(chars = text.len()))]
    pub async fn analyze_with_retry(
        &self,
        text: &str,
        category: &str,
        policy: &RetryPolicy,
    ) -> Result<AnalysisResult, EngineError> {
        let prompt = Self::prompt_for(text, category)?;
        let prompt = prompt.as_str();
        let invoker = &self.invoker;
        let raw = retry_on_recitation(policy, move || invoker.invoke(prompt)).await?;
        Self::interpret(&raw)
    }

    fn prompt_for(text: &str, category: &str) -> Result<String, EngineError> {
        let text = text.trim();
        let category = category.trim();
        if text.chars().count() < MIN_TEXT_CHARS {
            return Err(EngineError::InsufficientInput(format!(
                "contract text must contain at least {MIN_TEXT_CHARS} characters"
            )));
        }
        if category.is_empty() {
            return Err(EngineError::InsufficientInput(
                "contract category must not be empty".to_string(),
            ));
        }
        Ok(prompts::analysis_prompt(category, text))
    }

    fn interpret(raw: &str) -> Result<AnalysisResult, EngineError> {
        let (result, tier) = parse_analysis(raw)?;
        info!(
            %tier,
            risks = result.risks.len(),
            opportunities = result.opportunities.len(),
            score = result.overall_score,
            "Analysis parsed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::testing::ScriptedModel;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn contract_text() -> String {
        "LEASE AGREEMENT. The Tenant agrees to a term of 12 months at a monthly rent of $1,500. "
            .repeat(4)
    }

    fn engine(model: Arc<ScriptedModel>) -> AnalysisEngine {
        AnalysisEngine::new(ModelInvoker::new(model, Duration::from_secs(30)))
    }

    #[tokio::test]
    async fn valid_response_is_returned_as_is() {
        let raw = r#"{"summary": "Lease", "overallScore": 72,
            "risks": [{"risk": "Late fee", "riskDetails": "5%", "severity": "HIGH"}],
            "opportunities": []}"#;
        let model = Arc::new(ScriptedModel::with_responses([raw]));

        let result = engine(model.clone()).analyze(&contract_text(), "Lease").await.unwrap();

        assert_eq!(result, serde_json::from_str::<AnalysisResult>(raw).unwrap());
        assert_eq!(model.calls(), 1);
        assert!(model.prompts()[0].contains("Lease contract"));
    }

    #[tokio::test]
    async fn empty_response_short_circuits() {
        let model = Arc::new(ScriptedModel::with_responses([""]));
        let err = engine(model).analyze(&contract_text(), "Lease").await.unwrap_err();
        assert!(matches!(err, EngineError::ModelInvocation(ModelError::EmptyResponse)));
    }

    #[tokio::test]
    async fn error_marker_short_circuits_before_any_tier() {
        // Would be salvageable if the tiers ran.
        let model = Arc::new(ScriptedModel::with_responses([
            r#"[GoogleGenerativeAI Error]: bad request "summary": "salvage me""#,
        ]));
        let err = engine(model).analyze(&contract_text(), "Lease").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::ModelInvocation(ModelError::ErrorPreamble(_))
        ));
    }

    #[tokio::test]
    async fn preconditions_are_checked_before_the_call() {
        let model = Arc::new(ScriptedModel::new());
        let engine = engine(model.clone());

        let short = engine.analyze("too short", "Lease").await.unwrap_err();
        let no_category = engine.analyze(&contract_text(), "  ").await.unwrap_err();

        assert!(matches!(short, EngineError::InsufficientInput(_)));
        assert!(matches!(no_category, EngineError::InsufficientInput(_)));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_model_times_out() {
        let model = Arc::new(
            ScriptedModel::with_responses([r#"{"summary":"x","risks":[],"opportunities":[]}"#])
                .with_delay(Duration::from_secs(60)),
        );
        let err = engine(model).analyze(&contract_text(), "Lease").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::ModelInvocation(ModelError::Timeout(30_000))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_variant_reasks_after_recitation() {
        let model = Arc::new(ScriptedModel::new());
        model.push_err(ModelError::Recitation("RECITATION".into()));
        model.push_ok(r#"{"summary": "ok", "risks": [], "opportunities": []}"#);

        let result = engine(model.clone())
            .analyze_with_retry(&contract_text(), "Lease", &RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(result.summary, "ok");
        assert_eq!(model.calls(), 2);
    }
}
