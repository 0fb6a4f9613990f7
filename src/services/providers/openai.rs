//! OpenAI-compatible chat-completion provider.
//!
//! Works against the official OpenAI API as well as local servers that speak
//! the same wire format (LM Studio, Ollama, etc.). Supports both streaming
//! and non-streaming completions.

use super::{ChatOutcome, ChatProvider, ChatStream, ProviderError};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Public OpenAI endpoint, used when no base URL override is configured.
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Provider configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Base URL override; `None` means the public OpenAI endpoint.
    pub base_url: Option<String>,
    pub model: String,
}

/// OpenAI-compatible chat provider.
pub struct OpenAiChatProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiChatProvider {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Resolved backend base URL.
    pub fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_API_BASE)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url().trim_end_matches('/'))
    }

    fn build_request(&self, system: &str, user: &str, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            stream,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiChatProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<ChatOutcome, ProviderError> {
        let request = self.build_request(system, user, false);

        tracing::debug!(
            model = %self.config.model,
            text_len = user.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!(
                "chat completion failed with {}: {}",
                status, error_text
            )));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let text = api_response
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone());

        Ok(ChatOutcome {
            text,
            model: api_response.model,
            usage: api_response.usage,
        })
    }

    async fn stream(&self, system: &str, user: &str) -> Result<ChatStream, ProviderError> {
        let request = self.build_request(system, user, true);

        tracing::debug!(
            model = %self.config.model,
            text_len = user.len(),
            "Starting streaming chat completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!(
                "chat completion failed with {}: {}",
                status, error_text
            )));
        }

        let (tx, rx) = mpsc::channel(32);

        // Parse the SSE stream in a background task; each delta fragment is
        // forwarded through the channel as soon as it is decoded.
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        buffer.push_str(&String::from_utf8_lossy(&chunk));

                        // Process complete SSE events
                        while let Some(event_end) = buffer.find("\n\n") {
                            let event = buffer[..event_end].to_string();
                            buffer = buffer[event_end + 2..].to_string();

                            for line in event.lines() {
                                let Some(data) = line.strip_prefix("data: ") else {
                                    continue;
                                };

                                if data.trim() == "[DONE]" {
                                    return;
                                }

                                if let Ok(delta_event) =
                                    serde_json::from_str::<ChatCompletionChunk>(data)
                                {
                                    let content = delta_event
                                        .choices
                                        .first()
                                        .and_then(|c| c.delta.content.clone());

                                    if let Some(content) = content {
                                        if !content.is_empty()
                                            && tx.send(Ok(content)).await.is_err()
                                        {
                                            // Receiver dropped, stop reading.
                                            return;
                                        }
                                    }
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(ProviderError::Network(e.to_string()))).await;
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)) as ChatStream)
    }
}

// ============================================================================
// OpenAI API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiChatProvider {
        OpenAiChatProvider::new(OpenAiConfig {
            api_key: "test-key".to_string(),
            base_url: Some(server.uri()),
            model: "gpt-4o-mini".to_string(),
        })
    }

    #[tokio::test]
    async fn complete_parses_content_model_and_usage() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "stream": false,
                "messages": [
                    { "role": "system", "content": "check facts" },
                    { "role": "user", "content": "claim" },
                ],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4o-mini-2024",
                "choices": [
                    { "message": { "role": "assistant", "content": "This is misinformation." } }
                ],
                "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let outcome = provider
            .complete("check facts", "claim")
            .await
            .expect("completion should succeed");

        assert_eq!(outcome.text.as_deref(), Some("This is misinformation."));
        assert_eq!(outcome.model, "gpt-4o-mini-2024");
        assert_eq!(outcome.usage.unwrap()["total_tokens"], 17);
    }

    #[tokio::test]
    async fn complete_with_empty_choices_yields_no_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4o-mini",
                "choices": [],
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let outcome = provider.complete("p", "t").await.unwrap();

        assert!(outcome.text.is_none());
        assert!(outcome.usage.is_none());
    }

    #[tokio::test]
    async fn complete_surfaces_upstream_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider.complete("p", "t").await.unwrap_err();

        match err {
            ProviderError::Api(msg) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("backend down"));
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn stream_emits_delta_fragments_in_order() {
        let server = MockServer::start().await;

        let sse_body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Part \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\".\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{}}]}\n\n",
            "data: [DONE]\n\n",
        );

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({ "stream": true })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(sse_body, "text/event-stream"),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let mut stream = provider.stream("p", "t").await.unwrap();

        let mut fragments = Vec::new();
        while let Some(item) = stream.next().await {
            fragments.push(item.expect("fragment should decode"));
        }

        assert_eq!(fragments, vec!["Part ", "A", "."]);
    }
}
