//! Chat-completion provider abstraction and implementations.
//!
//! A trait seam between the HTTP handlers and the AI backend, allowing the
//! real OpenAI-compatible client to be swapped for a mock in tests.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::Stream;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Result of a buffered chat completion.
#[derive(Debug)]
pub struct ChatOutcome {
    /// Full message content, if the backend produced one.
    pub text: Option<String>,

    /// Model identifier echoed by the backend.
    pub model: String,

    /// Token accounting, passed through opaquely.
    pub usage: Option<serde_json::Value>,
}

/// Ordered stream of incremental content fragments.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Trait for chat-completion backends.
///
/// Both methods compose the same two-message conversation: a fixed system
/// prompt and the user-submitted text.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Single non-streaming completion.
    async fn complete(&self, system: &str, user: &str) -> Result<ChatOutcome, ProviderError>;

    /// Token-incremental completion.
    async fn stream(&self, system: &str, user: &str) -> Result<ChatStream, ProviderError>;
}
