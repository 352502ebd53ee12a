use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{ServiceError, ServiceResult};
use crate::tools::CapabilityName;

/// Service configuration, loaded once at startup and passed explicitly.
/// Nothing in the request path reads the ambient environment.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default = "default_analysis")]
    pub analysis: AnalysisConfig,

    #[serde(default = "default_storage")]
    pub storage: StorageConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Recognized LLM providers. Both speak the OpenAI chat-completions wire
/// format; they differ in base URL and in how much cleanup their replies need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Alternate,
}

/// LLM provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// Overrides the provider's default base URL when set.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default = "default_llm_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: None,
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: None,
            request_timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub fn base_url(&self) -> &str {
        match &self.base_url {
            Some(url) => url,
            None => match self.provider {
                LlmProvider::OpenAi => "https://api.openai.com/v1",
                LlmProvider::Alternate => "https://api.studio.nebius.ai/v1",
            },
        }
    }
}

/// Analysis microservice configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Endpoint base URL per capability.
    #[serde(default = "default_endpoints")]
    pub endpoints: HashMap<CapabilityName, String>,

    #[serde(default = "default_analysis_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Object storage gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,

    /// Bucket that chat image references are resolved against.
    #[serde(default = "default_upload_bucket")]
    pub upload_bucket: String,

    #[serde(default = "default_storage_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from an optional `config` file plus
    /// `PATHSIGHT__`-prefixed environment variables.
    pub fn load() -> ServiceResult<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("PATHSIGHT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ServiceError::Config {
                message: format!("Failed to build config: {}", e),
            })?
            .try_deserialize()
            .map_err(|e| ServiceError::Config {
                message: format!("Failed to deserialize config: {}", e),
            })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ServiceResult<()> {
        if self.llm.api_key.is_empty() {
            return Err(ServiceError::Config {
                message: "llm.api_key is not set".to_string(),
            });
        }
        Ok(())
    }
}

// ==================== Default Value Functions ====================

fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_analysis() -> AnalysisConfig {
    AnalysisConfig {
        endpoints: default_endpoints(),
        request_timeout_secs: default_analysis_timeout_secs(),
    }
}

fn default_endpoints() -> HashMap<CapabilityName, String> {
    HashMap::from([
        (
            CapabilityName::GetCancerSubtype,
            "http://127.0.0.1:54001".to_string(),
        ),
        (
            CapabilityName::GetBestImage,
            "http://127.0.0.1:54002".to_string(),
        ),
        (
            CapabilityName::GetSegmentationRun,
            "http://127.0.0.1:54003".to_string(),
        ),
    ])
}

fn default_analysis_timeout_secs() -> u64 {
    30
}

fn default_storage() -> StorageConfig {
    StorageConfig {
        endpoint: default_storage_endpoint(),
        upload_bucket: default_upload_bucket(),
        request_timeout_secs: default_storage_timeout_secs(),
    }
}

fn default_storage_endpoint() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_upload_bucket() -> String {
    "uploads".to_string()
}

fn default_storage_timeout_secs() -> u64 {
    30
}
