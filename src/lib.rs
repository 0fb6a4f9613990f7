//! fakenews-service: HTTP gateway for AI-assisted misinformation analysis.
//!
//! Relays user-submitted text, together with a fixed system prompt, to an
//! OpenAI-compatible chat-completion backend and returns the model's answer
//! either as a buffered JSON result or as a live token stream.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod startup;

use services::providers::ChatProvider;
use std::sync::Arc;

/// Shared application state, read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ChatProvider>,
    pub system_prompt: Arc<String>,
}

impl AppState {
    pub fn new(provider: Arc<dyn ChatProvider>, system_prompt: String) -> Self {
        Self {
            provider,
            system_prompt: Arc::new(system_prompt),
        }
    }
}
