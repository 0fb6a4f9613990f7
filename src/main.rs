use fakenews_service::config::Config;
use fakenews_service::startup::Application;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load();

    tracing::info!(
        backend = %config
            .base_url
            .as_deref()
            .unwrap_or("OpenAI API (https://api.openai.com/v1)"),
        model = %config.model,
        "Resolved AI backend"
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    tracing::info!("Fake News Detection API listening on port {}", app.port());

    app.run_until_stopped().await
}
