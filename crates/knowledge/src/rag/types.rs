//! Retrieval and answer types.

use crate::types::{Chunk, DocumentId};
use serde::{Deserialize, Serialize};

/// Length of the chunk preview in debug output, in characters.
pub const PREVIEW_CHARS: usize = 200;

/// A retrieved chunk and its similarity score (`1 - cosine distance`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

impl ScoredChunk {
    pub fn document_id(&self) -> &DocumentId {
        self.chunk.document_id()
    }
}

/// Ranked retrieval output for one query, highest score first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunks: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn new(chunks: Vec<ScoredChunk>) -> Self {
        Self { chunks }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Document ids in rank order, repeats included.
    pub fn document_ids(&self) -> Vec<&DocumentId> {
        self.chunks.iter().map(|c| c.document_id()).collect()
    }
}

/// A generated answer with its citations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,

    /// Distinct documents that made it into the context, first-seen order
    pub sources: Vec<DocumentId>,

    /// The retrieval that produced the context
    pub retrieval: RetrievalResult,
}

/// Per-chunk retrieval diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugHit {
    pub chunk_id: String,
    pub document_id: DocumentId,
    pub heading: String,
    pub chunk_index: usize,
    pub score: f32,
    pub preview: String,
}

impl DebugHit {
    pub fn from_scored(scored: &ScoredChunk) -> Self {
        Self {
            chunk_id: scored.chunk.id.to_string(),
            document_id: scored.document_id().clone(),
            heading: scored.chunk.heading.clone(),
            chunk_index: scored.chunk.index(),
            score: scored.score,
            preview: preview(&scored.chunk.text, PREVIEW_CHARS),
        }
    }
}

/// First `max_chars` characters of `text`.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkId;

    fn scored(doc: &str, index: usize, text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(ChunkId::new(DocumentId::new(doc), index), "Setup", text),
            score,
        }
    }

    #[test]
    fn test_preview_counts_characters() {
        assert_eq!(preview("héllo wörld", 5), "héllo");
        assert_eq!(preview("short", 200), "short");
    }

    #[test]
    fn test_debug_hit_from_scored() {
        let long_text = "x".repeat(500);
        let hit = DebugHit::from_scored(&scored("guides/setup.md", 3, &long_text, 0.75));

        assert_eq!(hit.chunk_id, "guides/setup.md::chunk3");
        assert_eq!(hit.document_id.as_str(), "guides/setup.md");
        assert_eq!(hit.heading, "Setup");
        assert_eq!(hit.chunk_index, 3);
        assert_eq!(hit.preview.chars().count(), PREVIEW_CHARS);
    }

    #[test]
    fn test_document_ids_keep_repeats() {
        let result = RetrievalResult::new(vec![
            scored("a.md", 0, "one", 0.9),
            scored("b.md", 0, "two", 0.8),
            scored("a.md", 1, "three", 0.7),
        ]);

        let ids: Vec<&str> = result.document_ids().iter().map(|d| d.as_str()).collect();
        assert_eq!(ids, vec!["a.md", "b.md", "a.md"]);
        assert_eq!(result.len(), 3);
    }
}
