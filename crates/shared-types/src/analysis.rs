//! Structured contract analysis as emitted by the language model.
//!
//! Field names follow the model's camelCase JSON shape. Only the three
//! mandatory fields (`risks`, `opportunities`, `summary`) are strict; every
//! other field decodes leniently so a slightly off-shape answer still parses.
//! Within the two lists, an entry without a label is dropped on its own.

use serde::{Deserialize, Serialize};

use crate::lenient::{self, Labeled};
use crate::types::{Impact, Severity};

/// Placeholder for a risk or opportunity whose explanation is missing.
pub const UNKNOWN_DETAILS: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskItem {
    #[serde(rename = "risk")]
    pub label: String,
    #[serde(
        rename = "riskDetails",
        alias = "explanation",
        default = "lenient::unknown_details",
        deserialize_with = "lenient::details"
    )]
    pub details: String,
    #[serde(default)]
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityItem {
    #[serde(rename = "opportunity")]
    pub label: String,
    #[serde(
        rename = "opportunityDetails",
        alias = "explanation",
        default = "lenient::unknown_details",
        deserialize_with = "lenient::details"
    )]
    pub details: String,
    #[serde(default)]
    pub impact: Impact,
}

impl Labeled for RiskItem {
    fn label(&self) -> &str {
        &self.label
    }
}

impl Labeled for OpportunityItem {
    fn label(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTermsDraft {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub details: Vec<String>,
}

impl FinancialTermsDraft {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.details.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompensationDraft {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub base_salary: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub bonuses: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub equity: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub other_benefits: Option<String>,
}

impl CompensationDraft {
    pub fn is_empty(&self) -> bool {
        self.base_salary.is_none()
            && self.bonuses.is_none()
            && self.equity.is_none()
            && self.other_benefits.is_none()
    }
}

/// Result of one contract analysis, before persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(deserialize_with = "lenient::labeled_list")]
    pub risks: Vec<RiskItem>,
    #[serde(deserialize_with = "lenient::labeled_list")]
    pub opportunities: Vec<OpportunityItem>,
    pub summary: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub clauses: Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub legal_compliance: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub negotiation_points: Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub contract_duration: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub termination_conditions: Option<String>,
    #[serde(default, deserialize_with = "lenient::score")]
    pub overall_score: u8,
    #[serde(default)]
    pub contract_financial_terms: Option<FinancialTermsDraft>,
    #[serde(default)]
    pub compensation_structure: Option<CompensationDraft>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub performance_metrics: Vec<String>,
}

impl AnalysisResult {
    /// True when the analysis carries nothing worth keeping.
    pub fn is_empty(&self) -> bool {
        self.risks.is_empty() && self.opportunities.is_empty() && self.summary.trim().is_empty()
    }

    /// Checks the invariants a stored review relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.summary.trim().is_empty() {
            return Err("summary must be a non-empty string".to_string());
        }
        if let Some(index) = self.risks.iter().position(|r| r.label.trim().is_empty()) {
            return Err(format!("risk #{} has an empty label", index + 1));
        }
        if let Some(index) = self
            .opportunities
            .iter()
            .position(|o| o.label.trim().is_empty())
        {
            return Err(format!("opportunity #{} has an empty label", index + 1));
        }
        Ok(())
    }
}
