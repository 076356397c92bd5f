//! Append-only chat history per review.

use chrono::{DateTime, Utc};
use shared_types::ChatTurn;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::RepositoryError;
use crate::db;

#[derive(Debug, FromRow)]
struct ChatTurnRow {
    id: String,
    contract_review_id: String,
    question: String,
    answer: String,
    created_at: DateTime<Utc>,
}

impl From<ChatTurnRow> for ChatTurn {
    fn from(row: ChatTurnRow) -> Self {
        ChatTurn {
            id: row.id,
            contract_review_id: row.contract_review_id,
            question: row.question,
            answer: row.answer,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct ChatRepository {
    pool: SqlitePool,
}

impl ChatRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        contract_review_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<ChatTurn, RepositoryError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO chat_turns (id, contract_review_id, question, answer, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(contract_review_id)
        .bind(question)
        .bind(answer)
        .bind(db::timestamp(created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound(contract_review_id.to_string())
            }
            other => RepositoryError::Persistence(other),
        })?;

        debug!(turn_id = %id, review_id = contract_review_id, "Chat turn stored");

        // Round-trip through the stored precision so callers see what a later read returns.
        let created_at = DateTime::parse_from_rfc3339(&db::timestamp(created_at))
            .map(|at| at.with_timezone(&Utc))
            .unwrap_or(created_at);

        Ok(ChatTurn {
            id,
            contract_review_id: contract_review_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            created_at,
        })
    }

    /// Oldest first, insertion order breaking ties.
    pub async fn list_by_contract(
        &self,
        contract_review_id: &str,
    ) -> Result<Vec<ChatTurn>, RepositoryError> {
        let rows: Vec<ChatTurnRow> = sqlx::query_as(
            r#"
            SELECT id, contract_review_id, question, answer, created_at
            FROM chat_turns
            WHERE contract_review_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(contract_review_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChatTurn::from).collect())
    }
}
