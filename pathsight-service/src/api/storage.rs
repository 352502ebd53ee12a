//! Upload and object storage proxy endpoints.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::ServiceError;

use super::AppState;

#[derive(Serialize)]
pub struct UploadResponse {
    /// Service-relative download path for the stored object.
    pub url: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Handle file uploads into the default uploads bucket
pub async fn upload_file_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ServiceError> {
    let bucket = state.service.config.storage.upload_bucket.clone();
    store_multipart(&state, &bucket, multipart).await
}

/// Handle file uploads into a caller-named bucket
pub async fn upload_to_bucket_handler(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ServiceError> {
    store_multipart(&state, &bucket, multipart).await
}

async fn store_multipart(
    state: &AppState,
    bucket: &str,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServiceError> {
    while let Some(field) =
        multipart
            .next_field()
            .await
            .map_err(|e| ServiceError::InvalidRequest {
                message: format!("invalid multipart payload: {}", e),
            })?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(|s| s.to_string()).ok_or_else(|| {
            ServiceError::InvalidRequest {
                message: "file field is missing a filename".to_string(),
            }
        })?;
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ServiceError::InvalidRequest {
                message: format!("failed to read upload: {}", e),
            })?;

        state
            .service
            .storage
            .upload(bucket, &filename, data, &content_type)
            .await?;
        info!(bucket = %bucket, filename = %filename, "File uploaded");

        return Ok(Json(UploadResponse {
            url: format!("/bucket/{}/download/{}", bucket, filename),
            mime_type: content_type,
        }));
    }

    Err(ServiceError::InvalidRequest {
        message: "multipart payload contained no file field".to_string(),
    })
}

/// Stream an object's bytes back to the caller
pub async fn download_file_handler(
    State(state): State<Arc<AppState>>,
    Path((bucket, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    let (bytes, content_type) = state.service.storage.download(&bucket, &filename).await?;
    let content_type =
        content_type.unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Delete an object
pub async fn delete_file_handler(
    State(state): State<Arc<AppState>>,
    Path((bucket, filename)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>, ServiceError> {
    state.service.storage.delete(&bucket, &filename).await?;

    Ok(Json(DeleteResponse {
        message: "File deleted successfully".to_string(),
    }))
}
