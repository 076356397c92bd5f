//! The language-model seam and the timeout-bounded invoker around it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::ModelError;

/// Prefixes that mark a response as a provider failure rather than content.
pub const MODEL_ERROR_MARKERS: &[&str] = &["[GoogleGenerativeAI Error]:"];

/// A text-in, text-out generation service.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier recorded alongside everything this model produces.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Shared handle that applies the call timeout and screens responses.
#[derive(Clone)]
pub struct ModelInvoker {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl ModelInvoker {
    pub fn new(model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// One model call. Empty and error-prefixed responses are failures.
    pub async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        debug!(model = self.model.name(), prompt_chars = prompt.len(), "Invoking model");

        let raw = match tokio::time::timeout(self.timeout, self.model.generate(prompt)).await {
            Ok(result) => result?,
            Err(_) => {
                let ms = self.timeout.as_millis() as u64;
                error!(model = self.model.name(), timeout_ms = ms, "Model call timed out");
                return Err(ModelError::Timeout(ms));
            }
        };

        screen_response(raw)
    }
}

/// Reject responses that cannot contain usable content.
pub fn screen_response(raw: String) -> Result<String, ModelError> {
    let trimmed = raw.trim_start();
    if trimmed.trim_end().is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    if MODEL_ERROR_MARKERS.iter().any(|m| trimmed.starts_with(m)) {
        let first_line = trimmed.lines().next().unwrap_or_default().to_string();
        return Err(ModelError::ErrorPreamble(first_line));
    }
    Ok(raw)
}
