//! Query-time retrieval: embed the question, rank chunks by cosine
//! similarity.

use crate::embeddings::EmbeddingProvider;
use crate::rag::types::{DebugHit, RetrievalResult, ScoredChunk};
use crate::vector_index::{IndexInfo, VectorIndex};
use docqa_core::{AppError, AppResult};
use std::sync::Arc;
use tracing::instrument;

/// Largest accepted `top_k` unless configured otherwise.
pub const DEFAULT_MAX_TOP_K: usize = 20;

/// Embeds queries with the ingest-time model and queries the index.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    max_top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            max_top_k: DEFAULT_MAX_TOP_K,
        }
    }

    pub fn with_max_top_k(mut self, max_top_k: usize) -> Self {
        self.max_top_k = max_top_k;
        self
    }

    pub fn max_top_k(&self) -> usize {
        self.max_top_k
    }

    /// The `top_k` chunks most similar to `query`, highest score first.
    ///
    /// Scores are `1 - cosine distance`; equal scores keep index insertion
    /// order. An empty index, an unreadable index or one built with another
    /// embedding model is `RetrievalUnavailable`, never an empty result.
    #[instrument(skip(self), fields(model = %self.embedder.model_name()))]
    pub async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<RetrievalResult> {
        self.validate(query, top_k)?;
        let info = self.ready_index()?;

        let embedding = self.embedder.embed(query).await?;
        if embedding.len() != info.dimension {
            return Err(AppError::RetrievalUnavailable(format!(
                "Query embedding has dimension {} but the index was built with {}; re-run ingest",
                embedding.len(),
                info.dimension
            )));
        }

        // The index scan is synchronous; keep it off the async workers
        let index = Arc::clone(&self.index);
        let hits = tokio::task::spawn_blocking(move || index.query(&embedding, top_k))
            .await
            .map_err(|e| AppError::RetrievalUnavailable(format!("Index query task failed: {}", e)))?
            .map_err(|e| AppError::RetrievalUnavailable(format!("Index query failed: {}", e)))?;

        let chunks: Vec<ScoredChunk> = hits
            .into_iter()
            .map(|hit| ScoredChunk {
                score: 1.0 - hit.distance,
                chunk: hit.chunk,
            })
            .collect();

        if let (Some(first), Some(last)) = (chunks.first(), chunks.last()) {
            tracing::info!(
                "Retrieved {} chunks (top score: {:.3}, lowest: {:.3})",
                chunks.len(),
                first.score,
                last.score
            );
        }

        Ok(RetrievalResult::new(chunks))
    }

    /// Same ranking as [`retrieve`](Self::retrieve), flattened into
    /// per-chunk diagnostics.
    pub async fn debug_retrieve(&self, query: &str, top_k: usize) -> AppResult<Vec<DebugHit>> {
        let result = self.retrieve(query, top_k).await?;
        Ok(result.chunks.iter().map(DebugHit::from_scored).collect())
    }

    fn validate(&self, query: &str, top_k: usize) -> AppResult<()> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidQuery(
                "Query text must not be empty".to_string(),
            ));
        }

        if top_k == 0 || top_k > self.max_top_k {
            return Err(AppError::InvalidQuery(format!(
                "top_k must be between 1 and {}, got {}",
                self.max_top_k, top_k
            )));
        }

        Ok(())
    }

    /// Index metadata, provided the index holds chunks embedded with our
    /// model.
    fn ready_index(&self) -> AppResult<IndexInfo> {
        let unavailable =
            |e: AppError| AppError::RetrievalUnavailable(format!("Index unreachable: {}", e));

        let info = self.index.info().map_err(unavailable)?;
        let count = self.index.count().map_err(unavailable)?;

        let info = match info {
            Some(info) if count > 0 => info,
            _ => {
                return Err(AppError::RetrievalUnavailable(
                    "The document index is empty; run `docqa ingest` first".to_string(),
                ))
            }
        };

        if info.embedding_model != self.embedder.model_name() {
            return Err(AppError::RetrievalUnavailable(format!(
                "Index was built with embedding model '{}' but queries use '{}'; re-run ingest",
                info.embedding_model,
                self.embedder.model_name()
            )));
        }

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::HashProvider;
    use crate::types::{Chunk, ChunkId, DocumentId};
    use crate::vector_index::{IndexHit, IndexRecord, MemoryIndex};

    #[derive(Debug)]
    struct UnreachableEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for UnreachableEmbedder {
        fn provider_name(&self) -> &str {
            "unreachable"
        }

        fn model_name(&self) -> &str {
            "feature-hash-256"
        }

        fn dimensions(&self) -> Option<usize> {
            None
        }

        async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Err(AppError::Embedding("connection refused".to_string()))
        }
    }

    /// Reports a ready index but fails (or panics) when scanned.
    struct BrokenScanIndex {
        inner: Arc<MemoryIndex>,
        panic: bool,
    }

    impl VectorIndex for BrokenScanIndex {
        fn upsert(&self, record: &IndexRecord) -> AppResult<()> {
            self.inner.upsert(record)
        }

        fn query(&self, _embedding: &[f32], _top_k: usize) -> AppResult<Vec<IndexHit>> {
            if self.panic {
                panic!("scan crashed");
            }
            Err(AppError::Index("database is locked".to_string()))
        }

        fn count(&self) -> AppResult<usize> {
            self.inner.count()
        }

        fn info(&self) -> AppResult<Option<IndexInfo>> {
            self.inner.info()
        }

        fn replace_all(&self, records: &[IndexRecord], info: &IndexInfo) -> AppResult<()> {
            self.inner.replace_all(records, info)
        }

        fn reset(&self) -> AppResult<()> {
            self.inner.reset()
        }
    }

    const DOCS: &[(&str, &str)] = &[
        ("vpn.md", "VPN — Setup\n\nInstall the VPN client and connect to the corporate VPN gateway."),
        ("pto.md", "PTO — Requests\n\nRequest paid time off in the HR portal two weeks ahead."),
        ("laptops.md", "Laptops — Ordering\n\nOrder a new laptop through the IT service desk."),
    ];

    async fn indexed(provider: &HashProvider) -> Arc<MemoryIndex> {
        let texts: Vec<String> = DOCS.iter().map(|(_, t)| t.to_string()).collect();
        let embeddings = provider.embed_batch(&texts).await.unwrap();

        let records: Vec<IndexRecord> = DOCS
            .iter()
            .zip(embeddings)
            .map(|((doc, text), embedding)| IndexRecord {
                chunk: Chunk::new(ChunkId::new(DocumentId::new(*doc), 0), "Intro", *text),
                embedding,
            })
            .collect();

        let index = Arc::new(MemoryIndex::new());
        index
            .replace_all(&records, &IndexInfo::new(provider.model_name(), 256))
            .unwrap();
        index
    }

    async fn retriever() -> Retriever {
        let provider = HashProvider::new(256);
        let index = indexed(&provider).await;
        Retriever::new(Arc::new(provider), index)
    }

    #[tokio::test]
    async fn test_retrieve_ranks_relevant_document_first() {
        let result = retriever()
            .await
            .retrieve("How do I connect to the VPN?", 3)
            .await
            .unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result.chunks[0].document_id().as_str(), "vpn.md");
    }

    #[tokio::test]
    async fn test_scores_non_increasing() {
        let result = retriever()
            .await
            .retrieve("laptop order from IT", 3)
            .await
            .unwrap();

        assert!(result.chunks.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(result.chunks.iter().all(|c| c.score <= 1.0 + 1e-6));
    }

    #[tokio::test]
    async fn test_top_k_limits_results() {
        let result = retriever().await.retrieve("time off", 1).await.unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_queries_rejected() {
        let retriever = retriever().await;

        assert!(matches!(
            retriever.retrieve("", 5).await,
            Err(AppError::InvalidQuery(_))
        ));
        assert!(matches!(
            retriever.retrieve("   \n", 5).await,
            Err(AppError::InvalidQuery(_))
        ));
        assert!(matches!(
            retriever.retrieve("vpn", 0).await,
            Err(AppError::InvalidQuery(_))
        ));
        assert!(matches!(
            retriever.retrieve("vpn", 21).await,
            Err(AppError::InvalidQuery(_))
        ));
        assert!(retriever.retrieve("vpn", 20).await.is_ok());
    }

    #[tokio::test]
    async fn test_configured_max_top_k() {
        let retriever = retriever().await.with_max_top_k(2);
        assert!(matches!(
            retriever.retrieve("vpn", 3).await,
            Err(AppError::InvalidQuery(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_index_is_unavailable() {
        let retriever = Retriever::new(Arc::new(HashProvider::new(256)), Arc::new(MemoryIndex::new()));

        assert!(matches!(
            retriever.retrieve("vpn", 5).await,
            Err(AppError::RetrievalUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_model_mismatch_is_unavailable() {
        let index = indexed(&HashProvider::new(256)).await;
        let retriever = Retriever::new(Arc::new(HashProvider::new(128)), index);

        let err = retriever.retrieve("vpn", 5).await.unwrap_err();
        match err {
            AppError::RetrievalUnavailable(msg) => assert!(msg.contains("feature-hash-256")),
            other => panic!("Expected RetrievalUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let index = indexed(&HashProvider::new(256)).await;
        let retriever = Retriever::new(Arc::new(UnreachableEmbedder), index);

        assert!(matches!(
            retriever.retrieve("vpn", 5).await,
            Err(AppError::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_index_scan_failure_is_unavailable() {
        for panic in [false, true] {
            let provider = HashProvider::new(256);
            let inner = indexed(&provider).await;
            let retriever = Retriever::new(
                Arc::new(provider),
                Arc::new(BrokenScanIndex { inner, panic }),
            );

            assert!(matches!(
                retriever.retrieve("vpn", 5).await,
                Err(AppError::RetrievalUnavailable(_))
            ));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_retrievals() {
        let retriever = retriever().await;

        let (vpn, pto) = tokio::join!(
            retriever.retrieve("connect to the VPN", 1),
            retriever.retrieve("paid time off", 1)
        );

        assert_eq!(vpn.unwrap().chunks[0].document_id().as_str(), "vpn.md");
        assert_eq!(pto.unwrap().chunks[0].document_id().as_str(), "pto.md");
    }

    #[tokio::test]
    async fn test_debug_retrieve_matches_ranking() {
        let retriever = retriever().await;
        let result = retriever.retrieve("paid time off", 3).await.unwrap();
        let hits = retriever.debug_retrieve("paid time off", 3).await.unwrap();

        assert_eq!(hits.len(), result.len());
        for (hit, scored) in hits.iter().zip(&result.chunks) {
            assert_eq!(&hit.document_id, scored.document_id());
            assert_eq!(hit.score, scored.score);
            assert_eq!(hit.chunk_id, format!("{}::chunk0", hit.document_id));
        }
    }
}
