use fakenews_service::config::Config;
use fakenews_service::services::providers::ChatProvider;
use fakenews_service::startup::Application;
use std::path::PathBuf;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
}

impl TestApp {
    /// Spawn the application on a random port with the given provider.
    pub async fn spawn(provider: Arc<dyn ChatProvider>) -> Self {
        let config = Config {
            api_key: "test-key".to_string(),
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            port: 0, // Random port
            system_prompt_path: PathBuf::from("systemprompt.md"),
        };

        let app = Application::with_provider(config, "You are a fact checker.".to_string(), provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
        }
    }
}
