//! LLM provider factory.
//!
//! Resolves provider names from the configuration snapshot into client
//! instances, injecting credentials, and assembles the fallback router from
//! the configured priority order.

use std::sync::Arc;
use std::time::Duration;

use advisor_core::{AppConfig, AppError, AppResult};

use crate::client::LlmClient;
use crate::providers::{ChatCompletionsClient, StaticClient};
use crate::router::ProviderRouter;

/// Create an LLM client for a named provider.
///
/// # Errors
/// Returns an error when the provider is unknown or a required API key is
/// missing from the configuration.
pub fn create_client(provider: &str, config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let timeout = Duration::from_secs(config.llm_timeout_secs);

    match provider.to_lowercase().as_str() {
        "huggingface" | "hf" => {
            let api_key = config.huggingface_api_key.as_deref().ok_or_else(|| {
                AppError::Config("Hugging Face provider requires HUGGINGFACE_API_KEY".to_string())
            })?;
            Ok(Arc::new(ChatCompletionsClient::huggingface(
                api_key,
                &config.huggingface_model,
                timeout,
            )?))
        }
        "openai" => {
            let api_key = config.openai_api_key.as_deref().ok_or_else(|| {
                AppError::Config("OpenAI provider requires OPENAI_API_KEY".to_string())
            })?;
            Ok(Arc::new(ChatCompletionsClient::openai(
                api_key,
                &config.openai_model,
                timeout,
            )?))
        }
        "static" => Ok(Arc::new(StaticClient::default())),
        _ => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}

/// Build the fallback router from the configured provider order.
pub fn build_router(config: &AppConfig) -> AppResult<ProviderRouter> {
    if config.provider_order.is_empty() {
        return Err(AppError::Config(
            "Provider order must name at least one backend".to_string(),
        ));
    }

    let mut clients = Vec::with_capacity(config.provider_order.len());
    for provider in &config.provider_order {
        clients.push(create_client(provider, config)?);
    }

    Ok(ProviderRouter::new(
        clients,
        Duration::from_secs(config.llm_timeout_secs),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_keys() -> AppConfig {
        let mut config = AppConfig::default();
        config.huggingface_api_key = Some("hf-test".to_string());
        config.openai_api_key = Some("sk-test".to_string());
        config
    }

    #[test]
    fn test_create_known_providers() {
        let config = config_with_keys();
        assert_eq!(
            create_client("huggingface", &config).unwrap().provider_name(),
            "huggingface"
        );
        assert_eq!(
            create_client("openai", &config).unwrap().provider_name(),
            "openai"
        );
        assert_eq!(
            create_client("static", &config).unwrap().provider_name(),
            "static"
        );
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = AppConfig::default();
        assert!(create_client("openai", &config).is_err());
        assert!(create_client("huggingface", &config).is_err());
    }

    #[test]
    fn test_unknown_provider() {
        let config = config_with_keys();
        assert!(create_client("ollama", &config).is_err());
    }

    #[test]
    fn test_build_router_follows_order() {
        let mut config = config_with_keys();
        config.provider_order = vec!["openai".to_string(), "static".to_string()];

        let router = build_router(&config).unwrap();
        assert_eq!(router.provider_names(), vec!["openai", "static"]);
    }

    #[test]
    fn test_build_router_rejects_empty_order() {
        let mut config = config_with_keys();
        config.provider_order.clear();
        assert!(build_router(&config).is_err());
    }
}
