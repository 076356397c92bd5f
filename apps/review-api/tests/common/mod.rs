//! Shared fixtures for review-api integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use review_api::cache::{MemoryBlobStore, TemporaryBlobCache};
use review_api::config::ServerConfig;
use review_api::{db, AppState};
use review_engine::testing::ScriptedModel;
use serde_json::{json, Value};
use shared_pdf::fixtures::pdf_from_pages;
use sqlx::SqlitePool;

pub const OWNER: &str = "user-1";
pub const OTHER_USER: &str = "user-2";

pub async fn test_pool() -> SqlitePool {
    db::connect("sqlite::memory:")
        .await
        .expect("in-memory database")
}

/// A three-page lease, long enough for both classification and analysis.
pub fn lease_pdf() -> Vec<u8> {
    pdf_from_pages(&[
        &[
            "LEASE AGREEMENT",
            "This Lease Agreement is made between Acme Properties LLC (Landlord)",
            "and Jane Doe (Tenant) for the premises at 12 Harbor Street.",
        ],
        &[
            "The lease runs for a term of 12 months starting on the first of March.",
            "Monthly rent is 1,500 dollars, due on the first day of each month.",
        ],
        &[
            "Either party may terminate with sixty days written notice.",
            "The security deposit of 3,000 dollars is refundable at the end of the term.",
        ],
    ])
}

/// A well-formed analysis answer in the model's JSON shape.
pub fn analysis_json() -> Value {
    json!({
        "risks": [
            {"risk": "Automatic renewal", "riskDetails": "Renews unless cancelled", "severity": "HIGH"},
            {"risk": "Late fees", "riskDetails": "Uncapped late fees", "severity": "MEDIUM"}
        ],
        "opportunities": [
            {"opportunity": "Fixed rent", "opportunityDetails": "Rent locked for 12 months", "impact": "HIGH"},
            {"opportunity": "Deposit refund", "opportunityDetails": "Fully refundable", "impact": "MEDIUM"},
            {"opportunity": "Short notice", "opportunityDetails": "Sixty day exit", "impact": "LOW"}
        ],
        "summary": "Twelve month residential lease at 1,500 dollars per month.",
        "recommendations": ["Cap late fees"],
        "clauses": ["Term", "Rent", "Termination"],
        "legalCompliance": "Compliant with standard residential tenancy rules",
        "negotiationPoints": ["Notice period"],
        "contractDuration": "12 months",
        "terminationConditions": "Sixty days written notice",
        "overallScore": 72,
        "contractFinancialTerms": {"description": "Monthly rent", "details": ["1,500 dollars per month"]},
        "compensationStructure": {"baseSalary": null, "bonuses": null, "equity": null, "otherBenefits": null},
        "performanceMetrics": []
    })
}

pub fn analysis_answer() -> String {
    analysis_json().to_string()
}

pub fn chat_answer(query: &str, answer: &str) -> String {
    json!({ "query": query, "answer": answer }).to_string()
}

/// Everything an integration test needs to observe the wired application.
pub struct Harness {
    pub state: Arc<AppState>,
    pub model: Arc<ScriptedModel>,
    pub store: Arc<MemoryBlobStore>,
}

pub async fn harness(model: ScriptedModel) -> Harness {
    harness_with(model, ServerConfig::default()).await
}

pub async fn harness_with(model: ScriptedModel, config: ServerConfig) -> Harness {
    let model = Arc::new(model);
    let store = Arc::new(MemoryBlobStore::new());
    let blobs = TemporaryBlobCache::new(store.clone());
    let state = Arc::new(AppState::from_parts(
        config,
        test_pool().await,
        model.clone(),
        blobs,
    ));
    Harness {
        state,
        model,
        store,
    }
}
