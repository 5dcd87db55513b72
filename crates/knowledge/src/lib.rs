//! Document knowledge base and retrieval-augmented answering.
//!
//! Markdown documents are chunked along their headings, embedded, and kept
//! in a vector index. Questions are answered by retrieving the closest
//! chunks and asking an LLM to answer from them alone.
//!
//! - [`chunker`]: heading-aware chunking
//! - [`embeddings`]: embedding providers (OpenAI, Ollama, local hashing)
//! - [`vector_index`] / [`index`]: in-memory and SQLite vector indexes
//! - [`rag`]: retriever and answer generator
//! - [`ingest`]: offline index rebuild
//! - [`service`]: the query service used by the CLI and server
//! - [`eval`]: retrieval evaluation

pub mod chunker;
pub mod embeddings;
pub mod eval;
pub mod index;
pub mod ingest;
pub mod library;
pub mod rag;
pub mod service;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::Chunker;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use eval::{evaluate, load_cases, EvalCase, EvalOutcome, EvalReport};
pub use index::SqliteIndex;
pub use ingest::Ingestor;
pub use library::DocumentLibrary;
pub use rag::{Answer, AnswerGenerator, DebugHit, RetrievalResult, Retriever, ScoredChunk};
pub use service::{embedder_from_config, ingestor_from_config, open_index, QaService};
pub use types::{Chunk, ChunkId, Document, DocumentId, IngestStats};
pub use vector_index::{IndexHit, IndexInfo, IndexRecord, MemoryIndex, VectorIndex};
