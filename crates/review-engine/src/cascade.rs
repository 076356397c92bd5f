//! Tiered interpretation of a raw analysis response.
//!
//! Tiers are tried strictly in order and the first success wins:
//!
//! 1. [`ParseTier::Strict`]: the cleaned text is valid JSON of the right shape
//! 2. [`ParseTier::Repaired`]: valid after [`repair_json`]
//! 3. [`ParseTier::Salvaged`]: fields mined one by one with regexes
//!
//! Only the last tier's failure surfaces, as
//! [`EngineError::AnalysisUnrecoverable`].

use std::fmt;
use std::ops::ControlFlow;

use serde_json::Value;
use shared_types::AnalysisResult;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::repair::repair_json;
use crate::salvage::salvage;
use crate::text::strip_code_fences;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseTier {
    Strict,
    Repaired,
    Salvaged,
}

impl fmt::Display for ParseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseTier::Strict => "strict",
            ParseTier::Repaired => "repaired",
            ParseTier::Salvaged => "salvaged",
        };
        f.write_str(name)
    }
}

/// Why a single tier gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierFailure {
    #[error("invalid JSON: {0}")]
    Syntax(String),

    #[error("unexpected shape: {0}")]
    Shape(String),

    #[error("no recognizable fields")]
    Nothing,
}

type Tier = fn(&str) -> Result<AnalysisResult, TierFailure>;

/// The recovery strategies, least lossy first.
pub const TIERS: [(ParseTier, Tier); 3] = [
    (ParseTier::Strict, strict),
    (ParseTier::Repaired, repaired),
    (ParseTier::Salvaged, salvaged),
];

/// Interpret a raw model response, reporting which tier succeeded.
pub fn parse_analysis(raw: &str) -> Result<(AnalysisResult, ParseTier), EngineError> {
    let cleaned = strip_code_fences(raw);

    let outcome = TIERS
        .iter()
        .try_fold(Vec::new(), |mut failures, (tier, attempt)| {
            match attempt(&cleaned) {
                Ok(result) => ControlFlow::Break((result, *tier)),
                Err(failure) => {
                    debug!(%tier, %failure, "Parse tier failed");
                    failures.push(format!("{tier}: {failure}"));
                    ControlFlow::Continue(failures)
                }
            }
        });

    match outcome {
        ControlFlow::Break((result, tier)) => {
            if tier != ParseTier::Strict {
                warn!(%tier, "Analysis response needed recovery");
            }
            Ok((result, tier))
        }
        ControlFlow::Continue(failures) => {
            Err(EngineError::AnalysisUnrecoverable(failures.join("; ")))
        }
    }
}

pub fn strict(text: &str) -> Result<AnalysisResult, TierFailure> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| TierFailure::Syntax(e.to_string()))?;
    decode(value)
}

pub fn repaired(text: &str) -> Result<AnalysisResult, TierFailure> {
    strict(&repair_json(text))
}

pub fn salvaged(text: &str) -> Result<AnalysisResult, TierFailure> {
    salvage(text)
        .or_else(|| salvage(&repair_json(text)))
        .ok_or(TierFailure::Nothing)
}

/// Check the three mandatory fields, then decode the rest leniently.
fn decode(value: Value) -> Result<AnalysisResult, TierFailure> {
    let object = value
        .as_object()
        .ok_or_else(|| TierFailure::Shape("top-level value is not an object".into()))?;

    match object.get("summary") {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        _ => return Err(TierFailure::Shape("summary must be a non-empty string".into())),
    }
    for key in ["risks", "opportunities"] {
        if !object.get(key).is_some_and(Value::is_array) {
            return Err(TierFailure::Shape(format!("{key} must be an array")));
        }
    }

    serde_json::from_value(value).map_err(|e| TierFailure::Shape(e.to_string()))
}
