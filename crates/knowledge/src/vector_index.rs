//! Vector index contract and the in-memory implementation.
//!
//! An index stores chunks with their embeddings and answers nearest-neighbour
//! queries by cosine distance. It also remembers which embedding model and
//! dimension built it, so queries with a different model can be refused.

use crate::types::Chunk;
use chrono::{DateTime, Utc};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// A chunk and its embedding, as stored in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// One nearest-neighbour result.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub chunk: Chunk,

    /// Cosine distance in `[0, 2]`; 0 is identical direction
    pub distance: f32,
}

/// What built the current index contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub embedding_model: String,
    pub dimension: usize,
    pub built_at: DateTime<Utc>,
}

impl IndexInfo {
    pub fn new(embedding_model: impl Into<String>, dimension: usize) -> Self {
        Self {
            embedding_model: embedding_model.into(),
            dimension,
            built_at: Utc::now(),
        }
    }
}

/// Trait for vector index backends.
///
/// Methods take `&self` so one index can be shared behind an `Arc` by
/// concurrent readers; backends synchronise internally.
pub trait VectorIndex: Send + Sync {
    /// Insert or replace a single record, keyed by chunk id. A replaced
    /// record keeps its original insertion position.
    fn upsert(&self, record: &IndexRecord) -> AppResult<()>;

    /// The `top_k` records nearest to `embedding`, closest first. Equal
    /// distances keep insertion order.
    fn query(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<IndexHit>>;

    /// Number of stored records.
    fn count(&self) -> AppResult<usize>;

    /// Model and dimension of the current contents, `None` if never built.
    fn info(&self) -> AppResult<Option<IndexInfo>>;

    /// Atomically replace all contents and the recorded model.
    fn replace_all(&self, records: &[IndexRecord], info: &IndexInfo) -> AppResult<()>;

    /// Remove all records and the recorded model.
    fn reset(&self) -> AppResult<()>;
}

/// Cosine distance `1 - cos(a, b)`. Mismatched lengths or zero vectors are
/// treated as orthogonal.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 1.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot_product / (norm_a * norm_b)
}

/// Rank candidates (given in insertion order) by distance and keep the
/// closest `top_k`. The sort is stable, so ties keep insertion order.
pub(crate) fn rank_hits<I>(candidates: I, query: &[f32], top_k: usize) -> Vec<IndexHit>
where
    I: IntoIterator<Item = (Chunk, Vec<f32>)>,
{
    let mut hits: Vec<IndexHit> = candidates
        .into_iter()
        .map(|(chunk, embedding)| IndexHit {
            distance: cosine_distance(query, &embedding),
            chunk,
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits.truncate(top_k);
    hits
}

pub(crate) fn check_dimension(info: Option<&IndexInfo>, embedding: &[f32]) -> AppResult<()> {
    match info {
        Some(info) if info.dimension != embedding.len() => Err(AppError::Index(format!(
            "Embedding has dimension {}, index was built with {}",
            embedding.len(),
            info.dimension
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<IndexRecord>,
    info: Option<IndexInfo>,
}

/// Non-persistent index, for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    state: RwLock<MemoryState>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AppError {
    AppError::Index("In-memory index lock poisoned".to_string())
}

impl VectorIndex for MemoryIndex {
    fn upsert(&self, record: &IndexRecord) -> AppResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        check_dimension(state.info.as_ref(), &record.embedding)?;

        match state
            .records
            .iter_mut()
            .find(|r| r.chunk.id == record.chunk.id)
        {
            Some(existing) => *existing = record.clone(),
            None => state.records.push(record.clone()),
        }

        Ok(())
    }

    fn query(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<IndexHit>> {
        let state = self.state.read().map_err(poisoned)?;
        check_dimension(state.info.as_ref(), embedding)?;

        let candidates = state
            .records
            .iter()
            .map(|r| (r.chunk.clone(), r.embedding.clone()));

        Ok(rank_hits(candidates, embedding, top_k))
    }

    fn count(&self) -> AppResult<usize> {
        Ok(self.state.read().map_err(poisoned)?.records.len())
    }

    fn info(&self) -> AppResult<Option<IndexInfo>> {
        Ok(self.state.read().map_err(poisoned)?.info.clone())
    }

    fn replace_all(&self, records: &[IndexRecord], info: &IndexInfo) -> AppResult<()> {
        for record in records {
            check_dimension(Some(info), &record.embedding)?;
        }

        let mut state = self.state.write().map_err(poisoned)?;
        state.records = records.to_vec();
        state.info = Some(info.clone());
        Ok(())
    }

    fn reset(&self) -> AppResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.records.clear();
        state.info = None;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::types::{ChunkId, DocumentId};

    pub fn record(doc: &str, index: usize, text: &str, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord {
            chunk: Chunk::new(ChunkId::new(DocumentId::new(doc), index), "Intro", text),
            embedding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    fn filled() -> MemoryIndex {
        let index = MemoryIndex::new();
        index
            .replace_all(
                &[
                    record("a.md", 0, "east", vec![1.0, 0.0]),
                    record("b.md", 0, "north", vec![0.0, 1.0]),
                    record("c.md", 0, "north-east", vec![1.0, 1.0]),
                ],
                &IndexInfo::new("test-model", 2),
            )
            .unwrap();
        index
    }

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_query_orders_by_distance() {
        let hits = filled().query(&[1.0, 0.1], 3).unwrap();
        let docs: Vec<&str> = hits.iter().map(|h| h.chunk.document_id().as_str()).collect();

        assert_eq!(docs, vec!["a.md", "c.md", "b.md"]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_query_truncates_to_top_k() {
        assert_eq!(filled().query(&[1.0, 0.0], 2).unwrap().len(), 2);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = MemoryIndex::new();
        index
            .replace_all(
                &[
                    record("z.md", 0, "same", vec![1.0, 0.0]),
                    record("a.md", 0, "same", vec![1.0, 0.0]),
                ],
                &IndexInfo::new("m", 2),
            )
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].chunk.document_id().as_str(), "z.md");
        assert_eq!(hits[1].chunk.document_id().as_str(), "a.md");
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let index = filled();
        index
            .upsert(&record("a.md", 0, "updated", vec![0.0, 1.0]))
            .unwrap();

        assert_eq!(index.count().unwrap(), 3);
        let hits = index.query(&[0.0, 1.0], 3).unwrap();
        // a.md and b.md now tie; a.md was inserted first
        assert_eq!(hits[0].chunk.text, "updated");
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let index = filled();
        assert!(index.query(&[1.0, 0.0, 0.0], 1).is_err());
        assert!(index.upsert(&record("d.md", 0, "x", vec![1.0])).is_err());
    }

    #[test]
    fn test_reset_clears_info() {
        let index = filled();
        index.reset().unwrap();
        assert_eq!(index.count().unwrap(), 0);
        assert!(index.info().unwrap().is_none());
    }
}
