//! Persistence tests against in-memory SQLite.

mod common;

use common::{analysis_json, test_pool, OTHER_USER, OWNER};
use pretty_assertions::assert_eq;
use review_api::repository::{ChatRepository, ContractRepository, RepositoryError};
use shared_types::{AnalysisResult, Level};
use sqlx::SqlitePool;

fn analysis() -> AnalysisResult {
    serde_json::from_value(analysis_json()).unwrap()
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    n
}

#[tokio::test]
async fn persist_stores_review_with_all_children() {
    let pool = test_pool().await;
    let repo = ContractRepository::new(pool.clone());

    let review = repo
        .persist(OWNER, "lease text", "Lease", &analysis(), "scripted-model")
        .await
        .unwrap();

    assert_eq!(review.owner_id, OWNER);
    assert_eq!(review.category, "Lease");
    assert_eq!(review.overall_score, 72);
    assert_eq!(review.ai_model, "scripted-model");
    assert_eq!(review.risks.len(), 2);
    assert_eq!(review.opportunities.len(), 3);
    assert_eq!(review.risks[0].label, "Automatic renewal");
    assert_eq!(review.risks[0].severity, Level::High);
    assert_eq!(review.opportunities[2].impact, Level::Low);
    assert_eq!(review.key_clauses, vec!["Term", "Rent", "Termination"]);
    assert_eq!(review.contract_duration.as_deref(), Some("12 months"));
    assert_eq!(
        review.financial_terms.as_ref().map(|t| t.details.clone()),
        Some(vec!["1,500 dollars per month".to_string()])
    );
    // All-null compensation is not stored.
    assert_eq!(review.compensation_structure, None);

    assert_eq!(count(&pool, "risks").await, 2);
    assert_eq!(count(&pool, "opportunities").await, 3);
    assert_eq!(count(&pool, "financial_terms").await, 1);
    assert_eq!(count(&pool, "compensation_structures").await, 0);

    let reloaded = repo.find_by_id(&review.id).await.unwrap().unwrap();
    assert_eq!(reloaded, review);
}

#[tokio::test]
async fn delete_cascades_to_children_and_chats() {
    let pool = test_pool().await;
    let repo = ContractRepository::new(pool.clone());
    let chats = ChatRepository::new(pool.clone());

    let review = repo
        .persist(OWNER, "lease text", "Lease", &analysis(), "m")
        .await
        .unwrap();
    chats.append(&review.id, "How long?", "12 months").await.unwrap();

    let deleted = repo.delete_by_id(&review.id).await.unwrap();

    assert_eq!(deleted.id, review.id);
    assert_eq!(deleted.child_item_count(), 5);
    assert!(repo.find_by_id(&review.id).await.unwrap().is_none());
    for table in [
        "contract_reviews",
        "risks",
        "opportunities",
        "financial_terms",
        "chat_turns",
    ] {
        assert_eq!(count(&pool, table).await, 0, "{table} not emptied");
    }

    assert!(matches!(
        repo.delete_by_id(&review.id).await,
        Err(RepositoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn find_by_owner_is_isolated_and_newest_first() {
    let pool = test_pool().await;
    let repo = ContractRepository::new(pool);

    let first = repo
        .persist(OWNER, "first", "Lease", &analysis(), "m")
        .await
        .unwrap();
    let second = repo
        .persist(OWNER, "second", "Employment", &analysis(), "m")
        .await
        .unwrap();
    repo.persist(OTHER_USER, "other", "Lease", &analysis(), "m")
        .await
        .unwrap();

    let mine = repo.find_by_owner(OWNER).await.unwrap();

    let ids: Vec<&str> = mine.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    assert!(mine.iter().all(|r| r.risks.len() == 2 && r.opportunities.len() == 3));
    assert!(repo.find_by_owner("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn child_batch_failure_leaves_no_review() {
    let pool = test_pool().await;
    let repo = ContractRepository::new(pool.clone());
    sqlx::query("DROP TABLE risks").execute(&pool).await.unwrap();

    let result = repo
        .persist(OWNER, "lease text", "Lease", &analysis(), "m")
        .await;

    assert!(matches!(result, Err(RepositoryError::Persistence(_))));
    assert_eq!(count(&pool, "contract_reviews").await, 0);
    assert_eq!(count(&pool, "financial_terms").await, 0);
    assert_eq!(count(&pool, "opportunities").await, 0);
}

#[tokio::test]
async fn stored_review_is_returned_without_reading_it_back() {
    let pool = test_pool().await;
    let repo = ContractRepository::new(pool.clone());
    // Leaves the row undecodable, so only a read would fail.
    sqlx::query(
        "CREATE TRIGGER spoil_recommendations AFTER INSERT ON contract_reviews BEGIN \
         UPDATE contract_reviews SET recommendations_json = 'not json' WHERE id = NEW.id; END",
    )
    .execute(&pool)
    .await
    .unwrap();

    let review = repo
        .persist(OWNER, "lease text", "Lease", &analysis(), "m")
        .await
        .unwrap();

    assert_eq!(review.recommendations, analysis().recommendations);
    assert_eq!(review.risks.len(), 2);
    assert_eq!(count(&pool, "contract_reviews").await, 1);
    assert_eq!(count(&pool, "risks").await, 2);
    assert!(matches!(
        repo.find_by_id(&review.id).await,
        Err(RepositoryError::Corrupt(_))
    ));
}

#[tokio::test]
async fn invalid_analysis_writes_nothing() {
    let pool = test_pool().await;
    let repo = ContractRepository::new(pool.clone());

    let mut blank_summary = analysis();
    blank_summary.summary = "  ".into();
    let mut blank_label = analysis();
    blank_label.risks[1].label = String::new();

    for bad in [blank_summary, blank_label] {
        let result = repo.persist(OWNER, "text", "Lease", &bad, "m").await;
        assert!(matches!(result, Err(RepositoryError::InvalidAnalysis(_))));
    }
    let result = repo.persist(OWNER, "text", " ", &analysis(), "m").await;
    assert!(matches!(result, Err(RepositoryError::InvalidAnalysis(_))));

    assert_eq!(count(&pool, "contract_reviews").await, 0);
}

#[tokio::test]
async fn find_context_reports_missing_review() {
    let repo = ContractRepository::new(test_pool().await);
    assert!(matches!(
        repo.find_context("missing").await,
        Err(RepositoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn chat_history_is_ordered_and_scoped() {
    let pool = test_pool().await;
    let repo = ContractRepository::new(pool.clone());
    let chats = ChatRepository::new(pool);

    let a = repo.persist(OWNER, "a", "Lease", &analysis(), "m").await.unwrap();
    let b = repo.persist(OWNER, "b", "Lease", &analysis(), "m").await.unwrap();

    for i in 0..5 {
        chats.append(&a.id, &format!("q{i}"), &format!("a{i}")).await.unwrap();
        chats.append(&b.id, "other", "other").await.unwrap();
    }

    let history = chats.list_by_contract(&a.id).await.unwrap();

    let questions: Vec<&str> = history.iter().map(|t| t.question.as_str()).collect();
    assert_eq!(questions, vec!["q0", "q1", "q2", "q3", "q4"]);
    assert!(history.iter().all(|t| t.contract_review_id == a.id));
    assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn appended_turn_matches_stored_turn() {
    let pool = test_pool().await;
    let repo = ContractRepository::new(pool.clone());
    let chats = ChatRepository::new(pool);
    let review = repo.persist(OWNER, "a", "Lease", &analysis(), "m").await.unwrap();

    let turn = chats.append(&review.id, "How long?", "12 months").await.unwrap();

    assert_eq!(chats.list_by_contract(&review.id).await.unwrap(), vec![turn]);
}

#[tokio::test]
async fn chat_for_missing_review_is_not_found() {
    let chats = ChatRepository::new(test_pool().await);

    let result = chats.append("missing", "q", "a").await;

    assert!(matches!(result, Err(RepositoryError::NotFound(_))));
}
