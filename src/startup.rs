//! Application startup and lifecycle management.

use crate::config::Config;
use crate::error::AppError;
use crate::handlers::analyze::{analyze, analyze_complete};
use crate::handlers::status::status;
use crate::handlers::{method_not_allowed, preflight};
use crate::middleware::cors::cors_middleware;
use crate::services::providers::openai::{OpenAiChatProvider, OpenAiConfig};
use crate::services::providers::ChatProvider;
use crate::AppState;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Build the API router. Every route handles its own preflight and method
/// fallback; CORS headers are attached to all responses by the middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/status",
            get(status).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/api/analyze",
            post(analyze).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/api/analyze/complete",
            post(analyze_complete)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .layer(from_fn(cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// Reads the system prompt file and constructs the OpenAI-compatible
    /// provider. A missing prompt file is a fatal startup error.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let system_prompt =
            std::fs::read_to_string(&config.system_prompt_path).map_err(|e| {
                AppError::Config(anyhow::anyhow!(
                    "Failed to read system prompt {}: {}",
                    config.system_prompt_path.display(),
                    e
                ))
            })?;

        let provider: Arc<dyn ChatProvider> = Arc::new(OpenAiChatProvider::new(OpenAiConfig {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }));

        tracing::info!(model = %config.model, "Initialized chat-completion provider");

        Self::with_provider(config, system_prompt, provider).await
    }

    /// Build the application with a caller-supplied provider and prompt.
    /// Used by tests to inject mock backends.
    pub async fn with_provider(
        config: Config,
        system_prompt: String,
        provider: Arc<dyn ChatProvider>,
    ) -> Result<Self, AppError> {
        let state = AppState::new(provider, system_prompt);
        let router = build_router(state);

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}
