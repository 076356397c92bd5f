//! SQLite connection and schema.

use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    tracing::info!("Connecting to database: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to `:memory:` is its own database, so keep exactly one alive.
    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Running database migrations...");

    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS contract_reviews (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            contract_text TEXT NOT NULL,
            category TEXT NOT NULL,
            summary TEXT NOT NULL,
            overall_score INTEGER NOT NULL,
            recommendations_json TEXT NOT NULL DEFAULT '[]',
            key_clauses_json TEXT NOT NULL DEFAULT '[]',
            negotiation_points_json TEXT NOT NULL DEFAULT '[]',
            performance_metrics_json TEXT NOT NULL DEFAULT '[]',
            contract_duration TEXT,
            termination_conditions TEXT,
            legal_compliance TEXT,
            ai_model TEXT NOT NULL,
            schema_version INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS compensation_structures (
            id TEXT PRIMARY KEY,
            contract_review_id TEXT NOT NULL UNIQUE
                REFERENCES contract_reviews(id) ON DELETE CASCADE,
            base_salary TEXT,
            bonuses TEXT,
            equity TEXT,
            other_benefits TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS financial_terms (
            id TEXT PRIMARY KEY,
            contract_review_id TEXT NOT NULL UNIQUE
                REFERENCES contract_reviews(id) ON DELETE CASCADE,
            description TEXT,
            details_json TEXT NOT NULL DEFAULT '[]'
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS risks (
            id TEXT PRIMARY KEY,
            contract_review_id TEXT NOT NULL
                REFERENCES contract_reviews(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            label TEXT NOT NULL,
            details TEXT NOT NULL,
            severity TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS opportunities (
            id TEXT PRIMARY KEY,
            contract_review_id TEXT NOT NULL
                REFERENCES contract_reviews(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            label TEXT NOT NULL,
            details TEXT NOT NULL,
            impact TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS chat_turns (
            id TEXT PRIMARY KEY,
            contract_review_id TEXT NOT NULL
                REFERENCES contract_reviews(id) ON DELETE CASCADE,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_reviews_owner ON contract_reviews(owner_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_risks_review ON risks(contract_review_id)",
        "CREATE INDEX IF NOT EXISTS idx_opportunities_review ON opportunities(contract_review_id)",
        "CREATE INDEX IF NOT EXISTS idx_chat_turns_review ON chat_turns(contract_review_id, created_at)",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Migrations complete");
    Ok(())
}

/// Fixed-width UTC timestamp so that text ordering matches time ordering.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);

        assert_eq!(timestamp(earlier), "2024-01-01T09:00:00.000000Z");
        assert!(timestamp(earlier) < timestamp(later));
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = connect("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap();
        let names: Vec<&str> = tables.iter().map(|(name,)| name.as_str()).collect();

        assert!(names.contains(&"contract_reviews"));
        assert!(names.contains(&"chat_turns"));
    }
}
