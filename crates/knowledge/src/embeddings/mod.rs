//! Embedding providers.
//!
//! The same provider and model must serve ingestion and querying; the index
//! records which model built it.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use docqa_core::{AppError, AppResult};

/// Embed texts in request batches of at most `batch_size`, preserving
/// order. Fails on the first failing batch.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> AppResult<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = batch_size.max(1);
    let mut embeddings = Vec::with_capacity(texts.len());

    tracing::info!(
        "Embedding {} texts with provider '{}' (model: {}, batch size: {})",
        texts.len(),
        provider.provider_name(),
        provider.model_name(),
        batch_size
    );

    for (i, batch) in texts.chunks(batch_size).enumerate() {
        let vectors = provider.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} inputs",
                vectors.len(),
                batch.len()
            )));
        }

        tracing::debug!("Embedded batch {} ({} texts)", i + 1, batch.len());
        embeddings.extend(vectors);
    }

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::HashProvider;

    #[tokio::test]
    async fn test_embed_in_batches_preserves_order() {
        let provider = HashProvider::new(64);
        let texts: Vec<String> = (0..7).map(|i| format!("text number {}", i)).collect();

        let batched = embed_in_batches(&provider, &texts, 3).await.unwrap();
        let single = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(batched, single);
    }

    #[tokio::test]
    async fn test_embed_in_batches_empty() {
        let provider = HashProvider::new(64);
        assert!(embed_in_batches(&provider, &[], 10).await.unwrap().is_empty());
    }
}
