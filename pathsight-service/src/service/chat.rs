//! Two-pass conversation orchestration.
//!
//! Pass one sends the capability-aware system prompt plus the inbound history
//! (image references inlined) and asks the model to either answer or emit a
//! directive. If a registered directive comes back, the capability is
//! dispatched and pass two runs against a fresh two-message context to
//! narrate the raw result; the earlier history is deliberately not carried
//! into the interpretation pass.

use base64::Engine;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::directive;
use crate::error::{ServiceError, ServiceResult, StorageError};
use crate::llm::{ChatMessage, ContentPart, ImageUrl, MessageContent};

use super::PathsightService;

/// Outcome of one chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallReport>,
}

/// Reported when a capability fired during the turn.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionCallReport {
    pub name: String,
    pub raw_result: String,
    pub interpreted_result: String,
}

impl PathsightService {
    /// Run one conversation turn through the two-pass orchestration.
    pub async fn chat(&self, history: Vec<ChatMessage>) -> ServiceResult<ChatOutcome> {
        if history.is_empty() {
            return Err(ServiceError::InvalidRequest {
                message: "messages must not be empty".to_string(),
            });
        }

        let request_id = Uuid::new_v4();
        let model = self.llm.model();

        // First pass: system prompt + history, with every image reference
        // resolved to inline bytes before the request goes out.
        let mut messages = vec![ChatMessage::system(self.prompts.chat_system(model))];
        for message in history {
            messages.push(self.resolve_message(message).await?);
        }

        let reply = self.llm.chat(messages).await?;
        debug!(%request_id, reply_length = reply.len(), "Initial reply received");

        let Some(parsed) = directive::parse(&reply) else {
            return Ok(ChatOutcome {
                response: reply,
                function_call: None,
            });
        };

        let Some(meta) = self.registry.resolve(&parsed.name) else {
            // Not a recognized capability: treat the reply as conversational.
            debug!(%request_id, name = %parsed.name, "Directive name not in registry");
            return Ok(ChatOutcome {
                response: reply,
                function_call: None,
            });
        };

        info!(
            %request_id,
            capability = %meta.name,
            argument = %parsed.argument,
            "Dispatching capability"
        );
        let result = self.dispatch(meta, &parsed.argument).await;
        if result.is_error {
            warn!(
                %request_id,
                capability = %meta.name,
                result = %result.raw_text,
                "Capability invocation failed; interpreting the failure"
            );
        }

        // Second pass: fresh two-message context.
        let (system, user) = self.prompts.interpretation(model, meta.name, &result.raw_text);
        let interpreted = self
            .llm
            .chat(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .await?;

        Ok(ChatOutcome {
            response: interpreted.clone(),
            function_call: Some(FunctionCallReport {
                name: meta.name.to_string(),
                raw_result: result.raw_text,
                interpreted_result: interpreted,
            }),
        })
    }

    /// Resolve a message's image references to inline base64 payloads.
    ///
    /// An unresolvable reference fails the whole request: the conversation
    /// cannot proceed without the referenced visual content.
    async fn resolve_message(&self, message: ChatMessage) -> ServiceResult<ChatMessage> {
        if message.content.is_empty() {
            return Err(ServiceError::InvalidRequest {
                message: "message content must not be empty".to_string(),
            });
        }

        let content = match message.content {
            MessageContent::Text(text) => MessageContent::Text(text),
            MessageContent::Parts(parts) => {
                let mut resolved = Vec::with_capacity(parts.len());
                for part in parts {
                    resolved.push(match part {
                        ContentPart::Text { text } => ContentPart::Text { text },
                        ContentPart::ImageUrl { image_url } => {
                            self.inline_image(&image_url.url).await?
                        }
                    });
                }
                MessageContent::Parts(resolved)
            }
        };

        Ok(ChatMessage {
            role: message.role,
            content,
        })
    }

    /// Fetch a referenced upload and re-emit it as a data URL part. The
    /// original bucket/filename reference never reaches the provider.
    async fn inline_image(&self, url: &str) -> ServiceResult<ContentPart> {
        // Clients send service-relative download URLs; only the final path
        // segment names the object.
        let filename = url.rsplit('/').find(|s| !s.is_empty()).unwrap_or(url);
        let bucket = &self.config.storage.upload_bucket;

        let (bytes, content_type) =
            self.storage
                .download(bucket, filename)
                .await
                .map_err(|e| match e {
                    StorageError::NotFound { .. } => ServiceError::ImageResolution {
                        filename: filename.to_string(),
                        message: "referenced upload does not exist".to_string(),
                    },
                    other => ServiceError::ImageResolution {
                        filename: filename.to_string(),
                        message: other.to_string(),
                    },
                })?;

        let media_type = content_type.unwrap_or_else(|| "image/jpeg".to_string());
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

        Ok(ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{};base64,{}", media_type, encoded),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::service::test_support::test_service;
    use mockito::Matcher;

    /// Stub the interpretation pass; matched on the findings template wording
    /// so it can coexist with a first-pass mock on the same path.
    async fn mock_interpretation(server: &mut mockito::ServerGuard, reply: &str) -> mockito::Mock {
        server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex("model has detected".to_string()))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "choices": [{ "message": { "role": "assistant", "content": reply } }]
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    async fn mock_first_pass(server: &mut mockito::ServerGuard, reply: &str) -> mockito::Mock {
        server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex("What should we do".to_string()))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "choices": [{ "message": { "role": "assistant", "content": reply } }]
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    fn user_turn() -> Vec<ChatMessage> {
        vec![ChatMessage::user("What should we do with tcga_10.png?")]
    }

    #[tokio::test]
    async fn test_directive_reply_triggers_both_passes() {
        let mut llm = mockito::Server::new_async().await;
        let mut analysis = mockito::Server::new_async().await;

        let _first = mock_first_pass(&mut llm, "get_cancer_subtype, tcga_10.png").await;
        let _second = mock_interpretation(&mut llm, "The model identified lung adenocarcinoma.").await;
        let _analysis = analysis
            .mock("GET", "/process/tcga_10.png")
            .with_status(200)
            .with_body("LUAD: 0.91, LUSC: 0.07")
            .create_async()
            .await;

        let service = test_service(&llm.url(), &analysis.url(), "http://storage.invalid", 5);
        let outcome = service.chat(user_turn()).await.unwrap();

        assert_eq!(outcome.response, "The model identified lung adenocarcinoma.");
        let call = outcome.function_call.unwrap();
        assert_eq!(call.name, "get_cancer_subtype");
        assert_eq!(call.raw_result, "LUAD: 0.91, LUSC: 0.07");
        assert_eq!(
            call.interpreted_result,
            "The model identified lung adenocarcinoma."
        );
    }

    #[tokio::test]
    async fn test_plain_reply_passes_through() {
        let mut llm = mockito::Server::new_async().await;
        let first = mock_first_pass(&mut llm, "That's an interesting question.").await;

        let service = test_service(
            &llm.url(),
            "http://analysis.invalid",
            "http://storage.invalid",
            5,
        );
        let outcome = service.chat(user_turn()).await.unwrap();

        assert_eq!(outcome.response, "That's an interesting question.");
        assert!(outcome.function_call.is_none());
        first.assert_async().await;
    }

    #[tokio::test]
    async fn test_unregistered_directive_returns_reply_unchanged() {
        let mut llm = mockito::Server::new_async().await;
        let first = mock_first_pass(&mut llm, "magic_wand, tcga_10.png").await;

        let service = test_service(
            &llm.url(),
            "http://analysis.invalid",
            "http://storage.invalid",
            5,
        );
        let outcome = service.chat(user_turn()).await.unwrap();

        // No second pass, no function_call field, reply verbatim.
        assert_eq!(outcome.response, "magic_wand, tcga_10.png");
        assert!(outcome.function_call.is_none());
        first.assert_async().await;
    }

    #[tokio::test]
    async fn test_capability_timeout_still_gets_interpreted() {
        use std::io::Write;

        let mut llm = mockito::Server::new_async().await;
        let mut analysis = mockito::Server::new_async().await;

        let _first = mock_first_pass(&mut llm, "get_cancer_subtype, tcga_10.png").await;
        let second =
            mock_interpretation(&mut llm, "The analysis service did not respond in time.").await;
        let _analysis = analysis
            .mock("GET", "/process/tcga_10.png")
            .with_chunked_body(|writer| {
                std::thread::sleep(std::time::Duration::from_millis(1500));
                writer.write_all(b"late")
            })
            .create_async()
            .await;

        let service = test_service(&llm.url(), &analysis.url(), "http://storage.invalid", 1);
        let outcome = service.chat(user_turn()).await.unwrap();

        let call = outcome.function_call.unwrap();
        assert!(call.raw_result.contains("timed out"), "{}", call.raw_result);
        assert!(!call.interpreted_result.is_empty());
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_same_request_is_idempotent_with_deterministic_stubs() {
        let mut llm = mockito::Server::new_async().await;
        let mut analysis = mockito::Server::new_async().await;

        let _first = mock_first_pass(&mut llm, "get_best_image, tcga_11.png").await;
        let _second = mock_interpretation(&mut llm, "The closest match is another LUAD slide.").await;
        let _analysis = analysis
            .mock("GET", "/process/tcga_11.png")
            .with_status(200)
            .with_body("match: tcga_41.png (0.87)")
            .create_async()
            .await;

        let service = test_service(&llm.url(), &analysis.url(), "http://storage.invalid", 5);

        let first = service.chat(user_turn()).await.unwrap();
        let second = service.chat(user_turn()).await.unwrap();

        assert_eq!(first.response, second.response);
        let (a, b) = (first.function_call.unwrap(), second.function_call.unwrap());
        assert_eq!(a.name, b.name);
        assert_eq!(a.raw_result, b.raw_result);
        assert_eq!(a.interpreted_result, b.interpreted_result);
    }

    #[tokio::test]
    async fn test_missing_image_fails_the_request() {
        let mut storage = mockito::Server::new_async().await;
        let _missing = storage
            .mock("GET", "/uploads/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let service = test_service(
            "http://llm.invalid",
            "http://analysis.invalid",
            &storage.url(),
            5,
        );

        let history = vec![ChatMessage {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: "What is this?".to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: "/bucket/uploads/download/missing.png".to_string(),
                    },
                },
            ]),
        }];

        let err = service.chat(history).await.unwrap_err();
        assert!(matches!(err, ServiceError::ImageResolution { .. }));
    }

    #[tokio::test]
    async fn test_image_reference_is_inlined_before_the_llm_call() {
        let mut llm = mockito::Server::new_async().await;
        let mut storage = mockito::Server::new_async().await;

        let _object = storage
            .mock("GET", "/uploads/tcga_10.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body("png-bytes")
            .create_async()
            .await;

        // The request body must carry the inlined payload, never the
        // original reference.
        let llm_mock = llm
            .mock("POST", "/chat/completions")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("data:image/png;base64,".to_string()),
                Matcher::Regex(
                    base64::engine::general_purpose::STANDARD.encode("png-bytes"),
                ),
            ]))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "choices": [{ "message": { "role": "assistant", "content": "A pathology slide." } }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let service = test_service(&llm.url(), "http://analysis.invalid", &storage.url(), 5);

        let history = vec![ChatMessage {
            role: Role::User,
            content: MessageContent::Parts(vec![ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "/bucket/uploads/download/tcga_10.png".to_string(),
                },
            }]),
        }];

        let outcome = service.chat(history).await.unwrap();
        assert_eq!(outcome.response, "A pathology slide.");
        llm_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_message_content_is_rejected() {
        let service = test_service(
            "http://llm.invalid",
            "http://analysis.invalid",
            "http://storage.invalid",
            5,
        );

        let err = service
            .chat(vec![ChatMessage::user("")])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest { .. }));

        let err = service.chat(vec![]).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest { .. }));
    }
}
