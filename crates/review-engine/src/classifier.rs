//! Contract category detection.

use tracing::{info, instrument, warn};

use crate::error::{EngineError, ModelError};
use crate::model::ModelInvoker;
use crate::prompts;
use crate::text::{strip_code_fences, truncate_chars};

/// Shortest text worth classifying, in characters.
pub const MIN_TEXT_CHARS: usize = 50;
/// Characters of contract text sent with the prompt.
pub const PROMPT_PREFIX_CHARS: usize = 2000;
/// Longest plausible category label, in characters.
pub const MAX_LABEL_CHARS: usize = 50;

/// Maps contract text to a short, free-form category label such as `"Lease"`.
///
/// Labels are opaque: callers must not match them against a fixed set.
#[derive(Clone)]
pub struct DocumentClassifier {
    invoker: ModelInvoker,
}

impl DocumentClassifier {
    pub fn new(invoker: ModelInvoker) -> Self {
        Self { invoker }
    }

    #[instrument(skip_all, fields(chars = text.len()))]
    pub async fn classify(&self, text: &str) -> Result<String, EngineError> {
        let text = text.trim();
        if text.chars().count() < MIN_TEXT_CHARS {
            return Err(EngineError::InsufficientInput(format!(
                "contract text must contain at least {MIN_TEXT_CHARS} characters"
            )));
        }

        let prompt = prompts::classification_prompt(truncate_chars(text, PROMPT_PREFIX_CHARS));
        let raw = self.invoker.invoke(&prompt).await.map_err(|e| match e {
            ModelError::EmptyResponse | ModelError::ErrorPreamble(_) => {
                EngineError::ClassificationFailed(e.to_string())
            }
            other => EngineError::ModelInvocation(other),
        })?;

        let label = normalize_label(&raw)?;
        info!(category = %label, "Contract classified");
        Ok(label)
    }
}

fn normalize_label(raw: &str) -> Result<String, EngineError> {
    let label = strip_code_fences(raw);
    let label = label
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '.'))
        .to_string();

    if label.is_empty() {
        return Err(EngineError::ClassificationFailed(
            "model returned an empty label".to_string(),
        ));
    }
    let chars = label.chars().count();
    if chars > MAX_LABEL_CHARS {
        warn!(chars, "Rejecting implausibly long category label");
        return Err(EngineError::ClassificationFailed(format!(
            "label of {chars} characters exceeds {MAX_LABEL_CHARS}"
        )));
    }
    Ok(label)
}
