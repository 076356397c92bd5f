//! Shared domain types for contract review
//!
//! The AI-facing wire shape ([`AnalysisResult`]) lives next to the durable
//! records it is persisted as ([`ContractReview`], [`ChatTurn`]).

pub mod analysis;
mod lenient;
pub mod review;
pub mod types;

pub use analysis::{
    AnalysisResult, CompensationDraft, FinancialTermsDraft, OpportunityItem, RiskItem,
    UNKNOWN_DETAILS,
};
pub use review::{
    ChatTurn, CompensationStructure, ContractReview, FinancialTerms, LiveEvent, Opportunity, Risk,
    ANALYSIS_SCHEMA_VERSION,
};
pub use types::{Impact, Level, Severity};
