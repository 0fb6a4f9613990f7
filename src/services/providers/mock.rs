//! Mock chat provider for testing.

use super::{ChatOutcome, ChatProvider, ChatStream, ProviderError};
use async_trait::async_trait;
use serde_json::json;

/// Scripted chat provider. Replays a fixed response (complete mode) and a
/// fixed fragment sequence (streaming mode), optionally failing mid-stream
/// or before any call succeeds.
pub struct MockChatProvider {
    response_text: Option<String>,
    fragments: Vec<String>,
    stream_error: Option<String>,
    fail_all: Option<String>,
}

impl MockChatProvider {
    /// Provider that answers every complete call with `text` and streams it
    /// as a single fragment.
    pub fn with_response(text: &str) -> Self {
        Self {
            response_text: Some(text.to_string()),
            fragments: vec![text.to_string()],
            stream_error: None,
            fail_all: None,
        }
    }

    /// Provider that streams the given fragments in order.
    pub fn with_fragments(fragments: &[&str]) -> Self {
        Self {
            response_text: Some(fragments.concat()),
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            stream_error: None,
            fail_all: None,
        }
    }

    /// Provider that streams the given fragments and then fails.
    pub fn failing_after(fragments: &[&str], message: &str) -> Self {
        Self {
            response_text: None,
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            stream_error: Some(message.to_string()),
            fail_all: None,
        }
    }

    /// Provider whose every call fails before producing output.
    pub fn erroring(message: &str) -> Self {
        Self {
            response_text: None,
            fragments: Vec::new(),
            stream_error: None,
            fail_all: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(&self, _system: &str, user: &str) -> Result<ChatOutcome, ProviderError> {
        if let Some(message) = &self.fail_all {
            return Err(ProviderError::Api(message.clone()));
        }

        Ok(ChatOutcome {
            text: self.response_text.clone(),
            model: "mock-model".to_string(),
            usage: Some(json!({
                "prompt_tokens": user.len() as i64 / 4,
                "completion_tokens": 10,
                "total_tokens": user.len() as i64 / 4 + 10,
            })),
        })
    }

    async fn stream(&self, _system: &str, _user: &str) -> Result<ChatStream, ProviderError> {
        if let Some(message) = &self.fail_all {
            return Err(ProviderError::Api(message.clone()));
        }

        let mut items: Vec<Result<String, ProviderError>> =
            self.fragments.iter().cloned().map(Ok).collect();

        if let Some(message) = &self.stream_error {
            items.push(Err(ProviderError::Api(message.clone())));
        }

        Ok(Box::pin(tokio_stream::iter(items)))
    }
}
