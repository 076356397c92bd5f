//! Contract review API server
//!
//! Provides REST endpoints for:
//! - Contract type detection from an uploaded PDF
//! - AI analysis of a contract into a stored review
//! - Review listing, retrieval and deletion
//! - Follow-up chat about a review, pushed live over SSE

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod presence;
pub mod repository;
pub mod services;
pub mod state;

pub use state::AppState;

/// Headroom for multipart framing and the other form fields.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.max_upload_bytes + BODY_LIMIT_SLACK;

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Upload pipeline
        .route("/api/contracts/detect-type", post(handlers::detect_type))
        .route("/api/contracts/analyze", post(handlers::analyze))
        // Stored reviews
        .route("/api/contracts", get(handlers::list_reviews))
        .route(
            "/api/contracts/:id",
            get(handlers::get_review).delete(handlers::delete_review),
        )
        // Chat
        .route(
            "/api/contracts/:id/chats",
            get(handlers::list_chats).post(handlers::ask_chat),
        )
        // Live events
        .route("/api/events", get(handlers::events))
        // Add middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
