//! Contract review persistence.

use std::collections::HashMap;

use chrono::{DateTime, SubsecRound, Utc};
use shared_types::{
    AnalysisResult, CompensationStructure, ContractReview, FinancialTerms, Level, Opportunity,
    Risk, ANALYSIS_SCHEMA_VERSION,
};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::RepositoryError;
use crate::db;

/// What a chat needs from a review, without loading its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewContext {
    pub id: String,
    pub owner_id: String,
    pub contract_text: String,
    pub category: String,
}

#[derive(Debug, FromRow)]
struct ReviewRow {
    id: String,
    owner_id: String,
    contract_text: String,
    category: String,
    summary: String,
    overall_score: i64,
    recommendations_json: String,
    key_clauses_json: String,
    negotiation_points_json: String,
    performance_metrics_json: String,
    contract_duration: Option<String>,
    termination_conditions: Option<String>,
    legal_compliance: Option<String>,
    ai_model: String,
    schema_version: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct CompensationRow {
    id: String,
    contract_review_id: String,
    base_salary: Option<String>,
    bonuses: Option<String>,
    equity: Option<String>,
    other_benefits: Option<String>,
}

#[derive(Debug, FromRow)]
struct FinancialTermsRow {
    id: String,
    contract_review_id: String,
    description: Option<String>,
    details_json: String,
}

/// Shared shape of the `risks` and `opportunities` tables.
#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    contract_review_id: String,
    label: String,
    details: String,
    level: String,
}

impl ItemRow {
    fn level(&self) -> Level {
        Level::parse(&self.level).unwrap_or_else(|| {
            warn!(id = %self.id, level = %self.level, "Unrecognised stored level");
            Level::default()
        })
    }

    fn into_risk(self) -> Risk {
        let severity = self.level();
        Risk {
            id: self.id,
            label: self.label,
            details: self.details,
            severity,
        }
    }

    fn into_opportunity(self) -> Opportunity {
        let impact = self.level();
        Opportunity {
            id: self.id,
            label: self.label,
            details: self.details,
            impact,
        }
    }
}

/// Children of one or more reviews, grouped by review id.
#[derive(Default)]
struct Children {
    compensation: HashMap<String, CompensationStructure>,
    financial: HashMap<String, FinancialTerms>,
    risks: HashMap<String, Vec<Risk>>,
    opportunities: HashMap<String, Vec<Opportunity>>,
}

const REVIEW_COLUMNS: &str = "r.id, r.owner_id, r.contract_text, r.category, r.summary, \
     r.overall_score, r.recommendations_json, r.key_clauses_json, r.negotiation_points_json, \
     r.performance_metrics_json, r.contract_duration, r.termination_conditions, \
     r.legal_compliance, r.ai_model, r.schema_version, r.created_at";

/// Selects the children of every review matched by `scope` (`r` is the review alias).
fn child_queries(scope: &str) -> [String; 4] {
    [
        format!(
            "SELECT c.id, c.contract_review_id, c.base_salary, c.bonuses, c.equity, c.other_benefits \
             FROM compensation_structures c JOIN contract_reviews r ON r.id = c.contract_review_id \
             WHERE {scope}"
        ),
        format!(
            "SELECT f.id, f.contract_review_id, f.description, f.details_json \
             FROM financial_terms f JOIN contract_reviews r ON r.id = f.contract_review_id \
             WHERE {scope}"
        ),
        format!(
            "SELECT i.id, i.contract_review_id, i.label, i.details, i.severity AS level \
             FROM risks i JOIN contract_reviews r ON r.id = i.contract_review_id \
             WHERE {scope} ORDER BY i.contract_review_id, i.position"
        ),
        format!(
            "SELECT i.id, i.contract_review_id, i.label, i.details, i.impact AS level \
             FROM opportunities i JOIN contract_reviews r ON r.id = i.contract_review_id \
             WHERE {scope} ORDER BY i.contract_review_id, i.position"
        ),
    ]
}

#[derive(Clone)]
pub struct ContractRepository {
    pool: SqlitePool,
}

impl ContractRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a review and everything its analysis produced.
    #[instrument(
        skip_all,
        fields(%owner_id, %category, risks = analysis.risks.len(), opportunities = analysis.opportunities.len())
    )]
    pub async fn persist(
        &self,
        owner_id: &str,
        contract_text: &str,
        category: &str,
        analysis: &AnalysisResult,
        ai_model: &str,
    ) -> Result<ContractReview, RepositoryError> {
        if owner_id.trim().is_empty() {
            return Err(RepositoryError::InvalidAnalysis("owner id must not be empty".into()));
        }
        if contract_text.trim().is_empty() {
            return Err(RepositoryError::InvalidAnalysis("contract text must not be empty".into()));
        }
        if category.trim().is_empty() {
            return Err(RepositoryError::InvalidAnalysis("category must not be empty".into()));
        }
        analysis.validate().map_err(RepositoryError::InvalidAnalysis)?;

        let review = draft(owner_id, contract_text, category, analysis, ai_model);
        self.insert_review(&review).await?;

        if let Err(e) = self.insert_items(&review).await {
            warn!(review_id = %review.id, error = %e, "Child insert failed, removing review");
            if let Err(cleanup) = sqlx::query("DELETE FROM contract_reviews WHERE id = ?")
                .bind(&review.id)
                .execute(&self.pool)
                .await
            {
                error!(review_id = %review.id, error = %cleanup, "Failed to remove partially stored review");
            }
            return Err(e);
        }

        info!(review_id = %review.id, "Contract review stored");
        Ok(review)
    }

    async fn insert_review(&self, review: &ContractReview) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO contract_reviews (
                id, owner_id, contract_text, category, summary, overall_score,
                recommendations_json, key_clauses_json, negotiation_points_json,
                performance_metrics_json, contract_duration, termination_conditions,
                legal_compliance, ai_model, schema_version, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&review.id)
        .bind(&review.owner_id)
        .bind(&review.contract_text)
        .bind(&review.category)
        .bind(&review.summary)
        .bind(i64::from(review.overall_score))
        .bind(serde_json::to_string(&review.recommendations)?)
        .bind(serde_json::to_string(&review.key_clauses)?)
        .bind(serde_json::to_string(&review.negotiation_points)?)
        .bind(serde_json::to_string(&review.performance_metrics)?)
        .bind(&review.contract_duration)
        .bind(&review.termination_conditions)
        .bind(&review.legal_compliance)
        .bind(&review.ai_model)
        .bind(i64::from(review.schema_version))
        .bind(db::timestamp(review.created_at))
        .execute(&mut *tx)
        .await?;

        if let Some(comp) = &review.compensation_structure {
            sqlx::query(
                r#"
                INSERT INTO compensation_structures
                    (id, contract_review_id, base_salary, bonuses, equity, other_benefits)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&comp.id)
            .bind(&review.id)
            .bind(&comp.base_salary)
            .bind(&comp.bonuses)
            .bind(&comp.equity)
            .bind(&comp.other_benefits)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(terms) = &review.financial_terms {
            sqlx::query(
                r#"
                INSERT INTO financial_terms (id, contract_review_id, description, details_json)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&terms.id)
            .bind(&review.id)
            .bind(&terms.description)
            .bind(serde_json::to_string(&terms.details)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Risks and opportunities in one all-or-nothing batch.
    async fn insert_items(&self, review: &ContractReview) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if !review.risks.is_empty() {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO risks (id, contract_review_id, position, label, details, severity) ",
            );
            builder.push_values(review.risks.iter().enumerate(), |mut row, (position, risk)| {
                row.push_bind(&risk.id)
                    .push_bind(&review.id)
                    .push_bind(position as i64)
                    .push_bind(&risk.label)
                    .push_bind(&risk.details)
                    .push_bind(risk.severity.as_str());
            });
            builder.build().execute(&mut *tx).await?;
        }

        if !review.opportunities.is_empty() {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO opportunities (id, contract_review_id, position, label, details, impact) ",
            );
            builder.push_values(
                review.opportunities.iter().enumerate(),
                |mut row, (position, opportunity)| {
                    row.push_bind(&opportunity.id)
                        .push_bind(&review.id)
                        .push_bind(position as i64)
                        .push_bind(&opportunity.label)
                        .push_bind(&opportunity.details)
                        .push_bind(opportunity.impact.as_str());
                },
            );
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<ContractReview>, RepositoryError> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM contract_reviews r WHERE r.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut children = self.load_children("r.id = ?", id).await?;
        assemble(row, &mut children).map(Some)
    }

    /// Every review owned by `owner_id`, newest first.
    pub async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<ContractReview>, RepositoryError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM contract_reviews r WHERE r.owner_id = ? \
             ORDER BY r.created_at DESC, r.rowid DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut children = self.load_children("r.owner_id = ?", owner_id).await?;
        rows.into_iter()
            .map(|row| assemble(row, &mut children))
            .collect()
    }

    pub async fn find_context(&self, id: &str) -> Result<ReviewContext, RepositoryError> {
        let row: Option<(String, String, String, String)> = sqlx::query_as(
            "SELECT id, owner_id, contract_text, category FROM contract_reviews WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let (id, owner_id, contract_text, category) =
            row.ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        Ok(ReviewContext {
            id,
            owner_id,
            contract_text,
            category,
        })
    }

    /// Hard delete; children and chat turns go with the review.
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: &str) -> Result<ContractReview, RepositoryError> {
        let review = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        let result = sqlx::query("DELETE FROM contract_reviews WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        info!(review_id = %id, "Contract review deleted");
        Ok(review)
    }

    async fn load_children(&self, scope: &str, key: &str) -> Result<Children, RepositoryError> {
        let [compensation_sql, financial_sql, risks_sql, opportunities_sql] = child_queries(scope);
        let mut children = Children::default();

        let compensation: Vec<CompensationRow> = sqlx::query_as(&compensation_sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await?;
        for row in compensation {
            children.compensation.insert(
                row.contract_review_id,
                CompensationStructure {
                    id: row.id,
                    base_salary: row.base_salary,
                    bonuses: row.bonuses,
                    equity: row.equity,
                    other_benefits: row.other_benefits,
                },
            );
        }

        let financial: Vec<FinancialTermsRow> = sqlx::query_as(&financial_sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await?;
        for row in financial {
            children.financial.insert(
                row.contract_review_id,
                FinancialTerms {
                    id: row.id,
                    description: row.description,
                    details: serde_json::from_str(&row.details_json)?,
                },
            );
        }

        let risks: Vec<ItemRow> = sqlx::query_as(&risks_sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await?;
        for row in risks {
            children
                .risks
                .entry(row.contract_review_id.clone())
                .or_default()
                .push(row.into_risk());
        }

        let opportunities: Vec<ItemRow> = sqlx::query_as(&opportunities_sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await?;
        for row in opportunities {
            children
                .opportunities
                .entry(row.contract_review_id.clone())
                .or_default()
                .push(row.into_opportunity());
        }

        Ok(children)
    }
}

/// The review exactly as it reads back once stored.
fn draft(
    owner_id: &str,
    contract_text: &str,
    category: &str,
    analysis: &AnalysisResult,
    ai_model: &str,
) -> ContractReview {
    ContractReview {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        contract_text: contract_text.to_string(),
        category: category.trim().to_string(),
        summary: analysis.summary.trim().to_string(),
        overall_score: analysis.overall_score.min(100),
        recommendations: analysis.recommendations.clone(),
        key_clauses: analysis.clauses.clone(),
        negotiation_points: analysis.negotiation_points.clone(),
        performance_metrics: analysis.performance_metrics.clone(),
        contract_duration: analysis.contract_duration.clone(),
        termination_conditions: analysis.termination_conditions.clone(),
        legal_compliance: analysis.legal_compliance.clone(),
        ai_model: ai_model.to_string(),
        schema_version: ANALYSIS_SCHEMA_VERSION,
        // Stored timestamps keep microseconds.
        created_at: Utc::now().trunc_subsecs(6),
        compensation_structure: analysis
            .compensation_structure
            .as_ref()
            .filter(|c| !c.is_empty())
            .map(|c| CompensationStructure {
                id: Uuid::new_v4().to_string(),
                base_salary: c.base_salary.clone(),
                bonuses: c.bonuses.clone(),
                equity: c.equity.clone(),
                other_benefits: c.other_benefits.clone(),
            }),
        financial_terms: analysis
            .contract_financial_terms
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(|t| FinancialTerms {
                id: Uuid::new_v4().to_string(),
                description: t.description.clone(),
                details: t.details.clone(),
            }),
        risks: analysis
            .risks
            .iter()
            .map(|r| Risk {
                id: Uuid::new_v4().to_string(),
                label: r.label.trim().to_string(),
                details: r.details.clone(),
                severity: r.severity,
            })
            .collect(),
        opportunities: analysis
            .opportunities
            .iter()
            .map(|o| Opportunity {
                id: Uuid::new_v4().to_string(),
                label: o.label.trim().to_string(),
                details: o.details.clone(),
                impact: o.impact,
            })
            .collect(),
    }
}

fn assemble(row: ReviewRow, children: &mut Children) -> Result<ContractReview, RepositoryError> {
    Ok(ContractReview {
        compensation_structure: children.compensation.remove(&row.id),
        financial_terms: children.financial.remove(&row.id),
        risks: children.risks.remove(&row.id).unwrap_or_default(),
        opportunities: children.opportunities.remove(&row.id).unwrap_or_default(),
        recommendations: serde_json::from_str(&row.recommendations_json)?,
        key_clauses: serde_json::from_str(&row.key_clauses_json)?,
        negotiation_points: serde_json::from_str(&row.negotiation_points_json)?,
        performance_metrics: serde_json::from_str(&row.performance_metrics_json)?,
        overall_score: row.overall_score.clamp(0, 100) as u8,
        schema_version: u32::try_from(row.schema_version).unwrap_or(ANALYSIS_SCHEMA_VERSION),
        id: row.id,
        owner_id: row.owner_id,
        contract_text: row.contract_text,
        category: row.category,
        summary: row.summary,
        contract_duration: row.contract_duration,
        termination_conditions: row.termination_conditions,
        legal_compliance: row.legal_compliance,
        ai_model: row.ai_model,
        created_at: row.created_at,
    })
}
