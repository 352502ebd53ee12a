//! Chat endpoint: the inbound edge of the two-pass orchestration.

use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::llm::ChatMessage;
use crate::service::ChatOutcome;

use super::AppState;

/// Inbound chat request. The message shape matches the provider wire format,
/// so history round-trips through the orchestrator without reshaping.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatOutcome>, ServiceError> {
    let outcome = state.service.chat(request.messages).await?;
    Ok(Json(outcome))
}
