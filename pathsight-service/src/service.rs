mod chat;
mod dispatch;

pub use chat::{ChatOutcome, FunctionCallReport};

use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::llm::LlmClient;
use crate::prompts::PromptLibrary;
use crate::storage::StorageClient;
use crate::tools::{AnalysisClient, CapabilityRegistry};

/// Main service coordinator
pub struct PathsightService {
    pub config: Arc<AppConfig>,
    pub llm: Arc<LlmClient>,
    pub storage: Arc<StorageClient>,
    pub registry: Arc<CapabilityRegistry>,
    analysis: AnalysisClient,
    prompts: PromptLibrary,
}


impl PathsightService {
    /// Create a new service instance
    pub fn new(config: Arc<AppConfig>) -> ServiceResult<Self> {
        info!("Initializing Pathsight service");

        let llm = Arc::new(LlmClient::new(config.llm.clone())?);
        info!(
            provider = ?config.llm.provider,
            model = %config.llm.model,
            "LLM client initialized"
        );

        let storage = Arc::new(StorageClient::new(&config.storage)?);

        let registry = Arc::new(CapabilityRegistry::from_config(&config.analysis)?);
        info!(capabilities = registry.len(), "Capability registry built");

        let analysis = AnalysisClient::new(config.analysis.request_timeout_secs).map_err(|e| {
            ServiceError::Internal {
                message: format!("Failed to build analysis HTTP client: {}", e),
            }
        })?;

        Ok(Self {
            config,
            llm,
            storage,
            registry,
            analysis,
            prompts: PromptLibrary::builtin(),
        })
    }
}
