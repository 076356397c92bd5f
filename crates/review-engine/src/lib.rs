//! Contract review engine
//!
//! Everything that talks to the language model lives here:
//!
//! - [`DocumentClassifier`] maps contract text to a short category label
//! - [`AnalysisEngine`] produces a structured [`AnalysisResult`] and owns the
//!   tiered recovery of malformed responses ([`cascade`])
//! - [`ChatQueryEngine`] answers one follow-up question about a contract
//!
//! The model itself sits behind the [`LanguageModel`] trait; [`GeminiClient`]
//! is the production implementation.
//!
//! [`AnalysisResult`]: shared_types::AnalysisResult

pub mod analysis;
pub mod cascade;
pub mod chat;
pub mod classifier;
pub mod error;
pub mod gemini;
pub mod model;
pub mod prompts;
pub mod repair;
pub mod retry;
mod salvage;
pub mod text;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use analysis::AnalysisEngine;
pub use cascade::{parse_analysis, ParseTier};
pub use chat::{ChatAnswer, ChatQueryEngine};
pub use classifier::DocumentClassifier;
pub use error::{EngineError, ModelError};
pub use gemini::{GeminiClient, GeminiConfig};
pub use model::{LanguageModel, ModelInvoker};
pub use retry::RetryPolicy;
