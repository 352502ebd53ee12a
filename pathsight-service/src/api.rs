//! HTTP API for the Pathsight service.
//!
//! This module provides the REST API endpoints for:
//! - Chat orchestration and direct function invocation
//! - File upload and object storage proxying
//! - Health monitoring

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{delete, get, post},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::PathsightService;

pub mod chat;
pub mod functions;
pub mod storage;

use chat::chat_handler;
use functions::function_handler;
use storage::{
    delete_file_handler, download_file_handler, upload_file_handler, upload_to_bucket_handler,
};

/// Application state
pub struct AppState {
    pub service: Arc<PathsightService>,
    pub start_time: Instant,
}

/// Upload size ceiling; whole-slide crops run large.
const MAX_UPLOAD_BYTES: usize = 52_428_800; // 50MB

/// Build the API router
pub fn router(service: Arc<PathsightService>) -> Router {
    let state = Arc::new(AppState {
        service,
        start_time: Instant::now(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/function", post(function_handler))
        .route(
            "/api/upload",
            post(upload_file_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/bucket/{bucket}/upload",
            post(upload_to_bucket_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/bucket/{bucket}/download/{filename}", get(download_file_handler))
        .route("/bucket/{bucket}/delete/{filename}", delete(delete_file_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Health ===

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: state.service.llm.model().to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    model: String,
}
