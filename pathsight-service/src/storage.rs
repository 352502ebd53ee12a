//! Object storage gateway client.
//!
//! The service only ever needs two things from storage: bytes for a name, and
//! storing bytes under a name. The gateway speaks plain path-style HTTP
//! (`{endpoint}/{bucket}/{object}`); bucket administration and replication
//! stay on the gateway side.

use bytes::Bytes;
use reqwest::{Client, StatusCode, header};
use std::time::Duration;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::StorageError;

/// Storage gateway client
pub struct StorageClient {
    client: Client,
    endpoint: String,
}

impl StorageClient {
    /// Create a new storage client
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| StorageError::Connection {
                url: config.endpoint.clone(),
                source: e,
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn object_url(&self, bucket: &str, object: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket, object)
    }

    /// Download an object's raw bytes, with its content type when the gateway
    /// reports one.
    pub async fn download(
        &self,
        bucket: &str,
        object: &str,
    ) -> Result<(Bytes, Option<String>), StorageError> {
        let url = self.object_url(bucket, object);

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| StorageError::Connection {
                    url: url.clone(),
                    source: e,
                })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                object: object.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(StorageError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Connection { url, source: e })?;

        debug!(bucket = %bucket, object = %object, size = bytes.len(), "Object downloaded");
        Ok((bytes, content_type))
    }

    /// Store bytes under a name.
    pub async fn upload(
        &self,
        bucket: &str,
        object: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = self.object_url(bucket, object);

        let response = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::Connection {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(StorageError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        debug!(bucket = %bucket, object = %object, "Object stored");
        Ok(())
    }

    /// Delete an object.
    pub async fn delete(&self, bucket: &str, object: &str) -> Result<(), StorageError> {
        let url = self.object_url(bucket, object);

        let response =
            self.client
                .delete(&url)
                .send()
                .await
                .map_err(|e| StorageError::Connection {
                    url: url.clone(),
                    source: e,
                })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                object: object.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(StorageError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
