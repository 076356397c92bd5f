//! HTTP handlers for the contract review API

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::{ChatTurn, ContractReview};

use crate::auth::ActingUser;
use crate::error::ApiError;
use crate::state::AppState;

const CONTRACT_FIELD: &str = "contract";
const CONTRACT_TYPE_FIELD: &str = "contractType";
const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Serialize)]
pub struct DetectTypeResponse {
    pub success: bool,
    pub category: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub chat_query: String,
}

/// Multipart upload after validation.
struct Upload {
    bytes: Vec<u8>,
    contract_type: Option<String>,
}

/// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "review-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/contracts/detect-type
pub async fn detect_type(
    State(state): State<Arc<AppState>>,
    user: ActingUser,
    multipart: Multipart,
) -> Result<Json<DetectTypeResponse>, ApiError> {
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;
    let category = state
        .pipeline
        .detect_category(user.id(), upload.bytes)
        .await?;

    Ok(Json(DetectTypeResponse {
        success: true,
        category,
    }))
}

/// POST /api/contracts/analyze
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    user: ActingUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ContractReview>), ApiError> {
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;
    let category = upload
        .contract_type
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::Validation(format!("missing field '{CONTRACT_TYPE_FIELD}'")))?;

    let review = state
        .pipeline
        .review(user.id(), upload.bytes, &category)
        .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /api/contracts
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    user: ActingUser,
) -> Result<Json<Vec<ContractReview>>, ApiError> {
    Ok(Json(state.reviews.find_by_owner(user.id()).await?))
}

/// GET /api/contracts/:id
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    user: ActingUser,
    Path(id): Path<String>,
) -> Result<Json<ContractReview>, ApiError> {
    let review = state
        .reviews
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Contract review {id}")))?;
    if review.owner_id != user.id() {
        return Err(ApiError::Forbidden(id));
    }
    Ok(Json(review))
}

/// DELETE /api/contracts/:id
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    user: ActingUser,
    Path(id): Path<String>,
) -> Result<Json<ContractReview>, ApiError> {
    let context = state.reviews.find_context(&id).await?;
    if context.owner_id != user.id() {
        return Err(ApiError::Forbidden(id));
    }
    Ok(Json(state.reviews.delete_by_id(&id).await?))
}

/// GET /api/contracts/:id/chats
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    user: ActingUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChatTurn>>, ApiError> {
    Ok(Json(state.chat.history(user.id(), &id).await?))
}

/// POST /api/contracts/:id/chats
pub async fn ask_chat(
    State(state): State<Arc<AppState>>,
    user: ActingUser,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<(StatusCode, Json<ChatTurn>), ApiError> {
    if req.chat_query.trim().is_empty() {
        return Err(ApiError::Validation("chatQuery must not be empty".to_string()));
    }
    let turn = state.chat.ask(user.id(), &id, &req.chat_query).await?;
    Ok((StatusCode::CREATED, Json(turn)))
}

/// GET /api/events - live events for the acting user
pub async fn events(
    State(state): State<Arc<AppState>>,
    user: ActingUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let connection = state.notifier.connect(user.id());

    let stream = stream::unfold(connection, |mut connection| async move {
        let event = connection.events.recv().await?;
        let sse = Event::default()
            .event(event.name)
            .data(event.payload.to_string());
        Some((Ok(sse), connection))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<Upload, ApiError> {
    let mut bytes = None;
    let mut contract_type = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            CONTRACT_FIELD => {
                if field.content_type() != Some(PDF_CONTENT_TYPE) {
                    return Err(ApiError::PayloadRejected(
                        "only application/pdf uploads are accepted".to_string(),
                    ));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_bytes))?;
                if data.len() > max_bytes {
                    return Err(ApiError::PayloadTooLarge(max_bytes));
                }
                bytes = Some(data.to_vec());
            }
            CONTRACT_TYPE_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_bytes))?;
                contract_type = Some(text);
            }
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| {
        ApiError::PayloadRejected(format!("missing file field '{CONTRACT_FIELD}'"))
    })?;
    if bytes.is_empty() {
        return Err(ApiError::PayloadRejected("uploaded file is empty".to_string()));
    }

    Ok(Upload {
        bytes,
        contract_type,
    })
}

fn multipart_error(err: MultipartError, max_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(max_bytes)
    } else {
        ApiError::PayloadRejected(err.body_text())
    }
}
