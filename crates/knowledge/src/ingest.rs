//! Offline ingestion: docs directory → chunks → embeddings → index.

use crate::chunker::Chunker;
use crate::embeddings::{embed_in_batches, EmbeddingProvider};
use crate::library::DocumentLibrary;
use crate::types::{Chunk, IngestStats};
use crate::vector_index::{IndexInfo, IndexRecord, VectorIndex};
use docqa_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Rebuilds the index from the docs directory.
///
/// Ingestion is all-or-nothing: every chunk is embedded before the index
/// is touched, then the contents are replaced in one step.
pub struct Ingestor {
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            chunker: Chunker::default(),
            embedder,
            index,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub async fn ingest(&self, docs_dir: &Path) -> AppResult<IngestStats> {
        let start = Instant::now();
        tracing::info!("Starting ingestion from {:?}", docs_dir);

        let documents = DocumentLibrary::new(docs_dir).load_all()?;

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut bytes = 0u64;
        for document in &documents {
            let document_chunks = self.chunker.chunk(document);
            tracing::info!("{}: {} chunks", document.id, document_chunks.len());

            bytes += document.body.len() as u64;
            chunks.extend(document_chunks);
        }

        if chunks.is_empty() {
            return Err(AppError::Config(format!(
                "Markdown files in {} contain no indexable text",
                docs_dir.display()
            )));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embed_in_batches(self.embedder.as_ref(), &texts, self.batch_size).await?;

        let dimension = embeddings.first().map(Vec::len).unwrap_or_default();
        let info = IndexInfo::new(self.embedder.model_name(), dimension);

        let records: Vec<IndexRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexRecord { chunk, embedding })
            .collect();

        self.index.replace_all(&records, &info)?;

        let duration = start.elapsed();
        tracing::info!(
            "Ingestion completed: {} documents, {} chunks, {} bytes in {:.2}s",
            documents.len(),
            records.len(),
            bytes,
            duration.as_secs_f64()
        );

        Ok(IngestStats {
            documents: documents.len(),
            chunks: records.len(),
            bytes,
            embedding_model: info.embedding_model,
            duration_secs: duration.as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::HashProvider;
    use crate::vector_index::MemoryIndex;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct RejectingEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for RejectingEmbedder {
        fn provider_name(&self) -> &str {
            "rejecting"
        }

        fn model_name(&self) -> &str {
            "rejecting"
        }

        fn dimensions(&self) -> Option<usize> {
            None
        }

        async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Err(AppError::Embedding("quota exceeded".to_string()))
        }
    }

    fn write_docs(root: &Path) {
        std::fs::write(
            root.join("onboarding.md"),
            "# Onboarding\n\nWelcome aboard.\n\n## Week 1\n\nMeet your buddy.\n\n## Week 2\n\nShip something.",
        )
        .unwrap();
        std::fs::write(root.join("vpn.md"), "## Setup\n\nInstall the client.").unwrap();
    }

    #[tokio::test]
    async fn test_ingest_populates_index() {
        let temp = TempDir::new().unwrap();
        write_docs(temp.path());

        let index = Arc::new(MemoryIndex::new());
        let ingestor = Ingestor::new(Arc::new(HashProvider::new(64)), index.clone());

        let stats = ingestor.ingest(temp.path()).await.unwrap();

        assert_eq!(stats.documents, 2);
        assert_eq!(stats.chunks, 4);
        assert_eq!(stats.embedding_model, "feature-hash-64");
        assert_eq!(index.count().unwrap(), 4);

        let info = index.info().unwrap().unwrap();
        assert_eq!(info.embedding_model, "feature-hash-64");
        assert_eq!(info.dimension, 64);
    }

    #[tokio::test]
    async fn test_reingest_replaces_contents() {
        let temp = TempDir::new().unwrap();
        write_docs(temp.path());

        let index = Arc::new(MemoryIndex::new());
        let ingestor =
            Ingestor::new(Arc::new(HashProvider::new(32)), index.clone()).with_batch_size(1);

        ingestor.ingest(temp.path()).await.unwrap();
        std::fs::remove_file(temp.path().join("onboarding.md")).unwrap();
        let stats = ingestor.ingest(temp.path()).await.unwrap();

        assert_eq!(stats.documents, 1);
        assert_eq!(index.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_embedding_failure_leaves_index_untouched() {
        let temp = TempDir::new().unwrap();
        write_docs(temp.path());

        let index = Arc::new(MemoryIndex::new());
        Ingestor::new(Arc::new(HashProvider::new(32)), index.clone())
            .ingest(temp.path())
            .await
            .unwrap();

        let result = Ingestor::new(Arc::new(RejectingEmbedder), index.clone())
            .ingest(temp.path())
            .await;

        assert!(matches!(result, Err(AppError::Embedding(_))));
        assert_eq!(index.count().unwrap(), 4);
        assert_eq!(
            index.info().unwrap().unwrap().embedding_model,
            "feature-hash-32"
        );
    }

    #[tokio::test]
    async fn test_missing_docs_dir() {
        let temp = TempDir::new().unwrap();
        let ingestor = Ingestor::new(Arc::new(HashProvider::new(32)), Arc::new(MemoryIndex::new()));

        let result = ingestor.ingest(&temp.path().join("docs")).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_whitespace_only_docs() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("blank.md"), "\n\n   \n").unwrap();
        let ingestor = Ingestor::new(Arc::new(HashProvider::new(32)), Arc::new(MemoryIndex::new()));

        let result = ingestor.ingest(temp.path()).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
