//! OpenAI-compatible chat completion client.

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use crate::config::{LlmConfig, LlmProvider};
use crate::error::LlmError;

/// One conversation turn, in the provider's wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// Who said it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Message content: plain text, or an ordered sequence of parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A single content part of a multimodal message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }
}

impl MessageContent {
    /// True when there is nothing to say: blank text, or no parts at all.
    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.trim().is_empty(),
            MessageContent::Parts(parts) => parts.is_empty(),
        }
    }
}

/// LLM provider client
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection {
                url: config.base_url().to_string(),
                source: e,
            })?;

        Ok(Self { client, config })
    }

    /// Model identity both passes run against
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// One chat completion round trip. Returns the assistant reply text after
    /// provider-specific cleanup.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url().trim_end_matches('/')
        );

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Completion { status, message });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse { source: e })?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyReply)?;

        debug!(
            model = %self.config.model,
            reply_length = reply.len(),
            "Chat completion received"
        );

        Ok(clean_reply(&reply, self.config.provider))
    }
}

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("hard-coded pattern"));
static USER_STYLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<userStyle>.*?</userStyle>").expect("hard-coded pattern"));

/// Normalize a raw assistant reply.
///
/// The alternate provider's models emit a visible reasoning section, provider
/// style markup, and escaped underscores; none of that may reach the
/// directive parser or the user.
fn clean_reply(reply: &str, provider: LlmProvider) -> String {
    match provider {
        LlmProvider::OpenAi => reply.to_string(),
        LlmProvider::Alternate => {
            let cleaned = THINK_BLOCK.replace_all(reply, "");
            let cleaned = USER_STYLE_TAG.replace_all(&cleaned, "");
            cleaned.replace("\\_", "_").trim().to_string()
        }
    }
}

// Internal provider wire types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
