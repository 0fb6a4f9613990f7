use std::env;
use std::path::PathBuf;

/// Default backend when neither an API key nor an explicit URL is set
/// (local OpenAI-compatible servers such as LM Studio).
pub const LOCAL_BASE_URL: &str = "http://127.0.0.1:1234/v1";

/// Placeholder key sent to local backends that do not check authentication.
const PLACEHOLDER_API_KEY: &str = "not-needed-for-local";

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_PORT: u16 = 3000;

/// Fixed relative path of the system prompt file.
pub const SYSTEM_PROMPT_PATH: &str = "systemprompt.md";

/// Immutable service configuration, resolved once at process start.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the chat-completion backend. Never empty: a placeholder
    /// is substituted when `OPENAI_API_KEY` is unset.
    pub api_key: String,
    /// Backend base URL. `None` means the provider's public endpoint.
    pub base_url: Option<String>,
    /// Chat-completion model identifier.
    pub model: String,
    /// HTTP listen port.
    pub port: u16,
    /// Path of the system prompt file read at startup.
    pub system_prompt_path: PathBuf,
}

impl Config {
    /// Resolve the configuration from environment variables.
    ///
    /// Every field has a default; there is no error path. Absence of an API
    /// key is permitted since local backends may not require one.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        let base_url = resolve_base_url(env::var("AI_URL").ok().as_deref(), &api_key);

        Config {
            api_key: if api_key.is_empty() {
                PLACEHOLDER_API_KEY.to_string()
            } else {
                api_key
            },
            base_url,
            model: env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            system_prompt_path: PathBuf::from(SYSTEM_PROMPT_PATH),
        }
    }
}

/// Backend URL resolution: an explicit URL wins; with a real API key the
/// provider's public endpoint is used (`None`); otherwise fall back to the
/// local development backend.
fn resolve_base_url(url_env: Option<&str>, api_key: &str) -> Option<String> {
    match url_env {
        Some(url) if !url.trim().is_empty() => Some(url.to_string()),
        _ if !api_key.is_empty() => None,
        _ => Some(LOCAL_BASE_URL.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_wins_over_api_key() {
        let url = resolve_base_url(Some("http://ai.internal/v1"), "sk-real-key");
        assert_eq!(url.as_deref(), Some("http://ai.internal/v1"));
    }

    #[test]
    fn api_key_without_url_uses_provider_default() {
        assert_eq!(resolve_base_url(None, "sk-real-key"), None);
    }

    #[test]
    fn no_key_and_no_url_falls_back_to_local() {
        assert_eq!(resolve_base_url(None, "").as_deref(), Some(LOCAL_BASE_URL));
    }

    #[test]
    fn empty_url_env_is_treated_as_unset() {
        assert_eq!(resolve_base_url(Some(""), "sk-real-key"), None);
        assert_eq!(resolve_base_url(Some("  "), "").as_deref(), Some(LOCAL_BASE_URL));
    }
}
