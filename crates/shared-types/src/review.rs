//! Durable records produced by the review pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Impact, Severity};

/// Version of the analysis shape stored with every review.
pub const ANALYSIS_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub id: String,
    pub label: String,
    pub details: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub label: String,
    pub details: String,
    pub impact: Impact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationStructure {
    pub id: String,
    pub base_salary: Option<String>,
    pub bonuses: Option<String>,
    pub equity: Option<String>,
    pub other_benefits: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialTerms {
    pub id: String,
    pub description: Option<String>,
    pub details: Vec<String>,
}

/// One analyzed contract together with all of its owned children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractReview {
    pub id: String,
    pub owner_id: String,
    pub contract_text: String,
    pub category: String,
    pub summary: String,
    pub overall_score: u8,
    pub recommendations: Vec<String>,
    pub key_clauses: Vec<String>,
    pub negotiation_points: Vec<String>,
    pub performance_metrics: Vec<String>,
    pub contract_duration: Option<String>,
    pub termination_conditions: Option<String>,
    pub legal_compliance: Option<String>,
    pub ai_model: String,
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub compensation_structure: Option<CompensationStructure>,
    pub financial_terms: Option<FinancialTerms>,
    pub risks: Vec<Risk>,
    pub opportunities: Vec<Opportunity>,
}

impl ContractReview {
    /// Number of risk and opportunity rows owned by this review.
    pub fn child_item_count(&self) -> usize {
        self.risks.len() + self.opportunities.len()
    }
}

/// A single question/answer exchange about a review. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: String,
    pub contract_review_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// Named event pushed to a live connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    pub name: String,
    pub payload: serde_json::Value,
}

impl LiveEvent {
    pub const NEW_MESSAGE: &'static str = "new-message";

    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}
