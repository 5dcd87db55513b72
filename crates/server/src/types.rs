//! Request and response bodies.

use docqa_knowledge::{Answer, DebugHit, ScoredChunk};
use serde::{Deserialize, Serialize};

/// Body of `/retrieve`, `/query` and `/debug-query`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,

    /// Falls back to the configured default
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Round a score to four decimals for the wire.
pub fn round_score(score: f32) -> f64 {
    (score as f64 * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Chunk id, `"{document}::chunk{n}"`
    pub doc_id: String,
    pub score: f64,
    pub text: String,
}

impl From<&ScoredChunk> for ChunkResult {
    fn from(scored: &ScoredChunk) -> Self {
        Self {
            doc_id: scored.chunk.id.to_string(),
            score: round_score(scored.score),
            text: scored.chunk.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub results: Vec<ChunkResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<String>,
    pub chunks: Vec<ChunkResult>,
}

impl From<Answer> for QueryResponse {
    fn from(answer: Answer) -> Self {
        Self {
            chunks: answer.retrieval.chunks.iter().map(ChunkResult::from).collect(),
            sources: answer.sources.iter().map(|s| s.to_string()).collect(),
            answer: answer.text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugChunk {
    pub doc_id: String,
    pub section: String,
    pub chunk_index: usize,
    pub score: f64,
    pub preview: String,
}

impl From<DebugHit> for DebugChunk {
    fn from(hit: DebugHit) -> Self {
        Self {
            doc_id: hit.chunk_id,
            section: hit.heading,
            chunk_index: hit.chunk_index,
            score: round_score(hit.score),
            preview: hit.preview,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugQueryResponse {
    pub query: String,
    pub results: Vec<DebugChunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub filename: String,
    pub content: String,
}
