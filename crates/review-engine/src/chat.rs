//! Single-turn questions about an analyzed contract.
//!
//! Unlike analysis there is no salvage: a garbled answer is worse than none.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::EngineError;
use crate::model::ModelInvoker;
use crate::prompts;
use crate::text::strip_code_fences;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub query: String,
    pub answer: String,
}

#[derive(Clone)]
pub struct ChatQueryEngine {
    invoker: ModelInvoker,
}

impl ChatQueryEngine {
    pub fn new(invoker: ModelInvoker) -> Self {
        Self { invoker }
    }

    /// Ask `question` about an already-extracted contract.
    #[instrument(skip(self, contract_text, question), fields(question_chars = question.len()))]
    pub async fn ask(
        &self,
        contract_text: &str,
        category: &str,
        question: &str,
    ) -> Result<ChatAnswer, EngineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EngineError::InsufficientInput(
                "question must not be empty".to_string(),
            ));
        }
        if contract_text.trim().is_empty() {
            return Err(EngineError::InsufficientInput(
                "contract has no stored text".to_string(),
            ));
        }

        let prompt = prompts::chat_prompt(category, contract_text, question);
        let raw = self.invoker.invoke(&prompt).await?;
        let answer = parse_chat_answer(&raw)?;

        info!(answer_chars = answer.answer.len(), "Chat answer parsed");
        Ok(answer)
    }
}

/// Strict `{query, answer}` parse; both fields must be present and non-blank.
pub fn parse_chat_answer(raw: &str) -> Result<ChatAnswer, EngineError> {
    let cleaned = strip_code_fences(raw);
    let answer: ChatAnswer = serde_json::from_str(&cleaned).map_err(|e| {
        warn!(error = %e, "Chat answer is not valid JSON");
        EngineError::ChatAnswerUnparseable(e.to_string())
    })?;

    if answer.query.trim().is_empty() || answer.answer.trim().is_empty() {
        return Err(EngineError::ChatAnswerUnparseable(
            "query and answer must both be non-empty".to_string(),
        ));
    }
    Ok(answer)
}
