use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Main service error type
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("Could not read image {filename}: {message}")]
    ImageResolution { filename: String, message: String },

    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("Storage error")]
    Storage(#[from] StorageError),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// LLM provider client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Connection failed to LLM provider at {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Completion failed (status {status}): {message}")]
    Completion { status: u16, message: String },

    #[error("Provider reply contained no completion")]
    EmptyReply,

    #[error("Invalid response from LLM provider")]
    InvalidResponse {
        #[source]
        source: reqwest::Error,
    },
}

/// Object storage gateway errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Connection failed to storage gateway at {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Object not found: {bucket}/{object}")]
    NotFound { bucket: String, object: String },

    #[error("Storage gateway error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::UnknownFunction { .. }
            | ServiceError::ImageResolution { .. }
            | ServiceError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Storage(StorageError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ServiceError::Llm(_) | ServiceError::Storage(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::UnknownFunction { .. } => "unknown_function",
            ServiceError::ImageResolution { .. } => "image_resolution",
            ServiceError::Llm(LlmError::Connection { .. }) => "llm_connection",
            ServiceError::Llm(LlmError::Completion { .. }) => "llm_completion",
            ServiceError::Llm(LlmError::EmptyReply) => "llm_empty_reply",
            ServiceError::Llm(LlmError::InvalidResponse { .. }) => "llm_invalid_response",
            ServiceError::Storage(StorageError::NotFound { .. }) => "object_not_found",
            ServiceError::Storage(_) => "storage_error",
            ServiceError::InvalidRequest { .. } => "invalid_request",
            ServiceError::Config { .. } => "config_error",
            ServiceError::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().to_string();

        let response = ErrorResponse {
            message: self.to_string(),
            code: Some(code),
        };

        (status, Json(response)).into_response()
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        let err = ServiceError::ImageResolution {
            filename: "tcga_10.png".to_string(),
            message: "referenced upload does not exist".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ServiceError::UnknownFunction {
            name: "magic_wand".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "unknown_function");
    }

    #[test]
    fn test_missing_object_maps_to_not_found() {
        let err = ServiceError::Storage(StorageError::NotFound {
            bucket: "uploads".to_string(),
            object: "tcga_99.png".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_provider_failures_map_to_bad_gateway() {
        let err = ServiceError::Llm(LlmError::Completion {
            status: 500,
            message: "overloaded".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), "llm_completion");
    }
}
