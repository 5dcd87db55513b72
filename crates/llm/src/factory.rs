//! LLM provider factory.
//!
//! Resolves a provider name from configuration into a ready client.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by OpenAI
/// * `timeout` - Per-request timeout
///
/// # Errors
/// Returns a configuration error if the provider is unknown or a required
/// API key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider).ok_or_else(|| {
        AppError::Config(format!(
            "Unknown LLM provider: {}. Supported: openai, ollama",
            provider
        ))
    })?;

    let endpoint = endpoint.unwrap_or(provider_type.default_endpoint());
    tracing::debug!("Creating {} client at {}", provider_type.as_str(), endpoint);

    match provider_type {
        ProviderType::Ollama => {
            let client = OllamaClient::with_base_url(endpoint).with_timeout(timeout)?;
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let client = OpenAiClient::new(api_key)
                .with_base_url(endpoint)
                .with_timeout(timeout)?;
            Ok(Arc::new(client))
        }
    }
}
