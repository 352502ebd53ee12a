//! Direct function invocation endpoint.
//!
//! Bypasses the LLM entirely: the caller names the capability and supplies
//! the arguments. Used by the frontend's "Explore AI models" flow and for
//! smoke-testing the analysis services.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ServiceError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct FunctionRequest {
    pub function_name: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FunctionResponse {
    pub result: String,
}

pub async fn function_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FunctionRequest>,
) -> Result<Json<FunctionResponse>, ServiceError> {
    let result = state
        .service
        .invoke_function(&request.function_name, &request.arguments)
        .await?;

    Ok(Json(FunctionResponse {
        result: result.raw_text,
    }))
}
