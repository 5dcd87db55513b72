//! Embedding provider trait and factory.

use crate::embeddings::providers::{HashProvider, OllamaProvider, OpenAiProvider};
use docqa_core::config::EmbeddingSettings;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding providers.
///
/// `embed_batch` is order-preserving and returns exactly one vector per
/// input. Empty input, transport failures, non-success statuses and
/// malformed responses are `AppError::Embedding`. One attempt, no retry.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "openai", "ollama", "hash")
    fn provider_name(&self) -> &str;

    /// Model identifier recorded in the index
    fn model_name(&self) -> &str;

    /// Vector dimension, when known before the first request
    fn dimensions(&self) -> Option<usize>;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        match (results.pop(), results.is_empty()) {
            (Some(embedding), true) => Ok(embedding),
            _ => Err(AppError::Embedding(
                "Expected exactly one embedding".to_string(),
            )),
        }
    }
}

/// Reject batches the providers cannot embed meaningfully.
pub(crate) fn validate_inputs(texts: &[String]) -> AppResult<()> {
    if texts.is_empty() {
        return Err(AppError::Embedding("No texts to embed".to_string()));
    }

    if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
        return Err(AppError::Embedding(format!(
            "Cannot embed empty text (input {})",
            i
        )));
    }

    Ok(())
}

/// Check a provider response carries one vector per input.
pub(crate) fn validate_outputs(
    provider: &str,
    expected: usize,
    embeddings: &[Vec<f32>],
) -> AppResult<()> {
    if embeddings.len() != expected {
        return Err(AppError::Embedding(format!(
            "{} returned {} embeddings for {} inputs",
            provider,
            embeddings.len(),
            expected
        )));
    }

    if let Some(first) = embeddings.first() {
        if first.is_empty() || embeddings.iter().any(|e| e.len() != first.len()) {
            return Err(AppError::Embedding(format!(
                "{} returned embeddings of inconsistent dimension",
                provider
            )));
        }
    }

    Ok(())
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    settings: &EmbeddingSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let timeout = Duration::from_secs(settings.timeout_secs);

    match settings.provider.as_str() {
        "openai" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config(format!(
                    "OpenAI embeddings require an API key (set {})",
                    settings.api_key_env
                ))
            })?;
            let mut provider = OpenAiProvider::new(&settings.model, api_key, timeout)?;
            if let Some(ref endpoint) = settings.endpoint {
                provider = provider.with_base_url(endpoint);
            }
            Ok(Arc::new(provider))
        }

        "ollama" => {
            let mut provider = OllamaProvider::new(&settings.model, timeout)?;
            if let Some(ref endpoint) = settings.endpoint {
                provider = provider.with_base_url(endpoint);
            }
            Ok(Arc::new(provider))
        }

        "hash" => Ok(Arc::new(HashProvider::new(settings.dimensions))),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, ollama, hash",
            settings.provider
        ))),
    }
}
