//! Capability dispatch and failure normalization.

use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::tools::{AnalysisError, CapabilityMetadata, CapabilityResult};

use super::PathsightService;

impl PathsightService {
    /// Invoke a resolved capability with its single argument string.
    ///
    /// Failures never escape: timeouts, non-2xx statuses, and transport
    /// errors are all folded into an error-flavored result so the
    /// interpretation pass can explain what happened instead of the request
    /// dying.
    pub(crate) async fn dispatch(
        &self,
        meta: &CapabilityMetadata,
        argument: &str,
    ) -> CapabilityResult {
        match self
            .analysis
            .process(&meta.endpoint, argument, meta.method)
            .await
        {
            Ok(body) => CapabilityResult::ok(body),
            Err(e @ (AnalysisError::Api { .. } | AnalysisError::Timeout { .. })) => {
                CapabilityResult::error(format!("Error: {}", e))
            }
            Err(e @ AnalysisError::Transport { .. }) => {
                // Already phrased "error analyzing image {filename}: ..."
                CapabilityResult::error(capitalize(&e.to_string()))
            }
        }
    }

    /// Direct invocation path for `POST /function`.
    ///
    /// Unlike directive dispatch, an unknown name here is a caller mistake
    /// and is rejected; the argument count must match the registry's
    /// documented arity.
    pub async fn invoke_function(
        &self,
        name: &str,
        arguments: &[String],
    ) -> ServiceResult<CapabilityResult> {
        let Some(meta) = self.registry.resolve(name) else {
            return Err(ServiceError::UnknownFunction {
                name: name.to_string(),
            });
        };

        if arguments.len() != meta.arity {
            return Err(ServiceError::InvalidRequest {
                message: format!(
                    "{} takes {} argument(s), got {}",
                    meta.name,
                    meta.arity,
                    arguments.len()
                ),
            });
        }

        debug!(capability = %meta.name, "Direct function invocation");
        let argument = arguments.first().map(String::as_str).unwrap_or_default();
        Ok(self.dispatch(meta, argument).await)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
