//! Router-level tests driven through `tower::ServiceExt::oneshot`.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{analysis_answer, chat_answer, harness, lease_pdf, Harness, OTHER_USER, OWNER};
use pretty_assertions::assert_eq;
use review_api::router;
use review_engine::testing::ScriptedModel;
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "review-test-boundary";

fn app(h: &Harness) -> Router {
    router(h.state.clone())
}

/// `(name, filename + content type, bytes)` parts.
fn multipart_body(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file {
            Some((filename, content_type)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, user: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-user-id", user)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-user-id", user)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_service() {
    let h = harness(ScriptedModel::new()).await;

    let response = app(&h)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "review-api");
}

#[tokio::test]
async fn missing_user_header_is_unauthenticated() {
    let h = harness(ScriptedModel::new()).await;

    let response = app(&h)
        .oneshot(
            Request::builder()
                .uri("/api/contracts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn detect_type_returns_category() {
    let h = harness(ScriptedModel::with_responses(["Lease"])).await;
    let pdf = lease_pdf();
    let body = multipart_body(&[("contract", Some(("lease.pdf", "application/pdf")), pdf.as_slice())]);

    let response = app(&h)
        .oneshot(upload("/api/contracts/detect-type", OWNER, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"success": true, "category": "Lease"})
    );
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn non_pdf_upload_is_rejected_before_the_model() {
    let h = harness(ScriptedModel::new()).await;
    let body = multipart_body(&[(
        "contract",
        Some(("notes.txt", "text/plain")),
        b"plain text".as_slice(),
    )]);

    let response = app(&h)
        .oneshot(upload("/api/contracts/detect-type", OWNER, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "PAYLOAD_REJECTED");
    assert_eq!(h.model.calls(), 0);
}

#[tokio::test]
async fn missing_file_is_rejected() {
    let h = harness(ScriptedModel::new()).await;
    let body = multipart_body(&[("contractType", None, b"Lease".as_slice())]);

    let response = app(&h)
        .oneshot(upload("/api/contracts/analyze", OWNER, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(h.model.calls(), 0);
}

#[tokio::test]
async fn analyze_creates_review_visible_only_to_owner() {
    let h = harness(ScriptedModel::with_responses([analysis_answer()])).await;
    let pdf = lease_pdf();
    let body = multipart_body(&[
        ("contract", Some(("lease.pdf", "application/pdf")), pdf.as_slice()),
        ("contractType", None, b"Lease".as_slice()),
    ]);

    let response = app(&h)
        .oneshot(upload("/api/contracts/analyze", OWNER, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let review = json_body(response).await;
    let id = review["id"].as_str().unwrap().to_string();
    assert_eq!(review["overall_score"], 72);
    assert_eq!(review["risks"].as_array().unwrap().len(), 2);

    let response = app(&h)
        .oneshot(get(&format!("/api/contracts/{id}"), OWNER))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(&h)
        .oneshot(get(&format!("/api/contracts/{id}"), OTHER_USER))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app(&h)
        .oneshot(get("/api/contracts", OTHER_USER))
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn chat_round_trip_and_delete() {
    let h = harness(ScriptedModel::with_responses([
        analysis_answer(),
        chat_answer("How long?", "Twelve months."),
    ]))
    .await;
    let review = h
        .state
        .pipeline
        .review(OWNER, lease_pdf(), "Lease")
        .await
        .unwrap();
    let chats_uri = format!("/api/contracts/{}/chats", review.id);

    let response = app(&h)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(&chats_uri)
                .header("x-user-id", OWNER)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"chatQuery": "How long?"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["answer"], "Twelve months.");

    let response = app(&h).oneshot(get(&chats_uri, OWNER)).await.unwrap();
    let history = json_body(response).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["question"], "How long?");

    let response = app(&h)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/contracts/{}", review.id))
                .header("x-user-id", OWNER)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(&h).oneshot(get(&chats_uri, OWNER)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_chat_query_is_a_validation_error() {
    let h = harness(ScriptedModel::with_responses([analysis_answer()])).await;
    let review = h
        .state
        .pipeline
        .review(OWNER, lease_pdf(), "Lease")
        .await
        .unwrap();

    let response = app(&h)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/contracts/{}/chats", review.id))
                .header("x-user-id", OWNER)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"chatQuery": "   "}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "VALIDATION_ERROR");
    assert_eq!(h.model.calls(), 1);
}
