//! The question-answering service shared by the CLI and the HTTP server.

use crate::chunker::Chunker;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::index::SqliteIndex;
use crate::ingest::Ingestor;
use crate::library::DocumentLibrary;
use crate::rag::{Answer, AnswerGenerator, DebugHit, RetrievalResult, Retriever};
use crate::types::Document;
use crate::vector_index::VectorIndex;
use docqa_core::{AppConfig, AppResult};
use docqa_llm::create_client;
use docqa_prompt::{load_prompt_or_default, ANSWER_PROMPT_ID};
use std::sync::Arc;
use std::time::Duration;

/// Build the configured embedding provider.
pub fn embedder_from_config(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    create_provider(&config.embedding, config.embedding_api_key().as_deref())
}

/// Open the persistent index at the configured path.
pub fn open_index(config: &AppConfig) -> AppResult<Arc<dyn VectorIndex>> {
    Ok(Arc::new(SqliteIndex::open(&config.index_file())?))
}

/// Build an ingestor over the configured embedder, index and chunk size.
pub fn ingestor_from_config(config: &AppConfig) -> AppResult<Ingestor> {
    Ok(
        Ingestor::new(embedder_from_config(config)?, open_index(config)?)
            .with_chunker(Chunker::new(config.chunking.max_chars))
            .with_batch_size(config.embedding.batch_size),
    )
}

/// Retrieval, answering and document access behind one handle.
#[derive(Clone)]
pub struct QaService {
    retriever: Retriever,
    generator: AnswerGenerator,
    library: DocumentLibrary,
    default_top_k: usize,
}

impl QaService {
    pub fn new(retriever: Retriever, generator: AnswerGenerator, library: DocumentLibrary) -> Self {
        Self {
            retriever,
            generator,
            library,
            default_top_k: 5,
        }
    }

    pub fn with_default_top_k(mut self, default_top_k: usize) -> Self {
        self.default_top_k = default_top_k;
        self
    }

    /// Wire the service from configuration: SQLite index, configured
    /// providers, and the workspace answer prompt if one is present.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let retriever = Retriever::new(embedder_from_config(config)?, open_index(config)?)
            .with_max_top_k(config.retrieval.max_top_k);

        let llm = create_client(
            &config.llm.provider,
            config.llm.endpoint.as_deref(),
            config.llm_api_key().as_deref(),
            Duration::from_secs(config.llm.timeout_secs),
        )?;

        let prompt = load_prompt_or_default(&config.workspace, ANSWER_PROMPT_ID)?;

        let generator = AnswerGenerator::new(llm, config.llm.model.as_str())
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens)
            .with_max_context_chars(config.retrieval.max_context_chars)
            .with_prompt(prompt);

        tracing::debug!(
            "QA service ready (embedding: {}/{}, llm: {}/{})",
            config.embedding.provider,
            config.embedding.model,
            config.llm.provider,
            config.llm.model
        );

        Ok(Self::new(retriever, generator, DocumentLibrary::new(config.docs_path()))
            .with_default_top_k(config.retrieval.default_top_k))
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn library(&self) -> &DocumentLibrary {
        &self.library
    }

    /// Retrieve then answer.
    pub async fn query(&self, question: &str, top_k: Option<usize>) -> AppResult<Answer> {
        let retrieval = self.retrieve(question, top_k).await?;
        self.generator.generate(question, retrieval).await
    }

    pub async fn retrieve(&self, question: &str, top_k: Option<usize>) -> AppResult<RetrievalResult> {
        self.retriever
            .retrieve(question, top_k.unwrap_or(self.default_top_k))
            .await
    }

    pub async fn debug_retrieve(&self, question: &str, top_k: Option<usize>) -> AppResult<Vec<DebugHit>> {
        self.retriever
            .debug_retrieve(question, top_k.unwrap_or(self.default_top_k))
            .await
    }

    pub fn list_documents(&self) -> AppResult<Vec<String>> {
        self.library.list()
    }

    pub fn document(&self, filename: &str) -> AppResult<Document> {
        self.library.get(filename)
    }
}
