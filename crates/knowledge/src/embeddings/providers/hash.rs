//! Local feature-hashing embedder.
//!
//! Deterministic and offline: lowercase word tokens and their character
//! trigrams are hashed into a fixed number of buckets, then the vector is
//! L2-normalised. Texts sharing vocabulary land close together, which is
//! enough for tests, demos and air-gapped use. It carries no semantics.

use crate::embeddings::provider::{validate_inputs, EmbeddingProvider};
use docqa_core::AppResult;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Weight of a trigram relative to its whole word.
const TRIGRAM_WEIGHT: f32 = 0.5;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |hash, b| (hash ^ *b as u64).wrapping_mul(FNV_PRIME))
}

/// Feature-hashing embedding provider.
#[derive(Debug, Clone)]
pub struct HashProvider {
    dimensions: usize,
    model: String,
}

impl HashProvider {
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            model: format!("feature-hash-{}", dimensions),
        }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        // High bit picks the sign so collisions tend to cancel
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            self.add_feature(&mut vector, word, 1.0);

            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut vector, &format!("#{}", trigram), TRIGRAM_WEIGHT);
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }

        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashProvider {
    fn provider_name(&self) -> &str {
        "hash"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        validate_inputs(texts)?;
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_dimensions_and_normalisation() {
        let provider = HashProvider::new(256);
        let embedding = provider.embed("How do I request a new laptop?").await.unwrap();

        assert_eq!(embedding.len(), 256);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert_eq!(provider.model_name(), "feature-hash-256");
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = HashProvider::new(128);
        let a = provider.embed("deterministic test").await.unwrap();
        let b = provider.embed("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let provider = HashProvider::new(512);
        let query = provider.embed("pull request review checklist").await.unwrap();
        let related = provider
            .embed("Before opening a pull request, walk through the review checklist.")
            .await
            .unwrap();
        let unrelated = provider
            .embed("The cafeteria serves lunch from noon until two.")
            .await
            .unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let provider = HashProvider::new(64);
        assert!(provider.embed("").await.is_err());
    }

    #[tokio::test]
    async fn test_punctuation_only_is_zero_vector() {
        let provider = HashProvider::new(64);
        let embedding = provider.embed("--- !!!").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }
}
