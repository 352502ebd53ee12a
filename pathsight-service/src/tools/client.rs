//! HTTP client for the analysis microservices.
//!
//! Every backing service shares the same convention: `{endpoint}/process/
//! {filename}` returning a plain-text or JSON body that the dispatcher treats
//! as an opaque string. One attempt per invocation, no retry: the services
//! are GPU-backed and possibly slow, and the surrounding orchestration
//! surfaces failures to the user in natural language instead of piling on
//! load.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use super::InvocationMethod;

/// Errors from a single capability invocation.
///
/// These never cross the conversation boundary as failures; the dispatcher
/// folds them into a textual result.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to get prediction for {filename} (status {status})")]
    Api { filename: String, status: u16 },

    #[error("analysis of {filename} timed out")]
    Timeout { filename: String },

    #[error("error analyzing image {filename}: {source}")]
    Transport {
        filename: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Analysis microservice client
#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
}

impl AnalysisClient {
    /// Create a new analysis client with a bounded per-request timeout.
    pub fn new(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        Self::with_timeout(Duration::from_secs(timeout_secs))
    }

    fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Invoke an analysis service for a filename.
    ///
    /// Only the basename of the argument is used: the LLM sometimes echoes
    /// bucket prefixes or stray directory components in the argument text,
    /// and none of them may reach the URL.
    pub async fn process(
        &self,
        endpoint_base: &str,
        filename: &str,
        method: InvocationMethod,
    ) -> Result<String, AnalysisError> {
        let filename = basename(filename);
        let url = format!(
            "{}/process/{}",
            endpoint_base.trim_end_matches('/'),
            filename
        );

        let request = match method {
            InvocationMethod::Get => self.client.get(&url),
            InvocationMethod::Post => self.client.post(&url),
        };

        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| classify_transport(filename, e))?;

        if !response.status().is_success() {
            return Err(AnalysisError::Api {
                filename: filename.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_transport(filename, e))
    }
}

fn classify_transport(filename: &str, source: reqwest::Error) -> AnalysisError {
    if source.is_timeout() {
        AnalysisError::Timeout {
            filename: filename.to_string(),
        }
    } else {
        AnalysisError::Transport {
            filename: filename.to_string(),
            source,
        }
    }
}

/// Reduce a path-like argument to its final non-empty component.
fn basename(path: &str) -> &str {
    path.trim()
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("")
}
