//! SQLite-backed vector index.
//!
//! Embeddings are stored as little-endian f32 blobs and searched by brute
//! force, which is plenty for a handbook-sized corpus.

use crate::types::{Chunk, ChunkId, DocumentId};
use crate::vector_index::{check_dimension, rank_hits, IndexHit, IndexInfo, IndexRecord, VectorIndex};
use docqa_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const INFO_KEY: &str = "index_info";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY,
    chunk_id TEXT NOT NULL UNIQUE,
    document_id TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    heading TEXT NOT NULL,
    text TEXT NOT NULL,
    hash TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id);

CREATE TABLE IF NOT EXISTS index_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const UPSERT_CHUNK: &str = r#"
INSERT INTO chunks (chunk_id, document_id, chunk_index, heading, text, hash, embedding)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT(chunk_id) DO UPDATE SET
    heading = excluded.heading,
    text = excluded.text,
    hash = excluded.hash,
    embedding = excluded.embedding
"#;

/// Persistent vector index in a single SQLite file.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Open (creating if needed) the index at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Index(format!("Failed to create index directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Opened SQLite index at {:?}", db_path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Index("SQLite connection lock poisoned".to_string()))
    }
}

fn read_info(conn: &Connection) -> AppResult<Option<IndexInfo>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM index_meta WHERE key = ?1",
            params![INFO_KEY],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| AppError::Index(format!("Failed to read index metadata: {}", e)))?;

    value
        .map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| AppError::Index(format!("Corrupt index metadata: {}", e)))
        })
        .transpose()
}

fn insert_record(conn: &Connection, record: &IndexRecord) -> AppResult<()> {
    let chunk = &record.chunk;
    conn.execute(
        UPSERT_CHUNK,
        params![
            chunk.id.to_string(),
            chunk.document_id().as_str(),
            chunk.index() as i64,
            chunk.heading,
            chunk.text,
            chunk.hash,
            embedding_to_bytes(&record.embedding),
        ],
    )
    .map_err(|e| AppError::Index(format!("Failed to insert chunk {}: {}", chunk.id, e)))?;

    Ok(())
}

impl VectorIndex for SqliteIndex {
    fn upsert(&self, record: &IndexRecord) -> AppResult<()> {
        let conn = self.conn()?;
        check_dimension(read_info(&conn)?.as_ref(), &record.embedding)?;
        insert_record(&conn, record)
    }

    fn query(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<IndexHit>> {
        let conn = self.conn()?;
        check_dimension(read_info(&conn)?.as_ref(), embedding)?;

        let mut stmt = conn
            .prepare(
                "SELECT document_id, chunk_index, heading, text, hash, embedding
                 FROM chunks ORDER BY id",
            )
            .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let chunk = Chunk {
                    id: ChunkId::new(
                        DocumentId::new(row.get::<_, String>(0)?),
                        row.get::<_, i64>(1)? as usize,
                    ),
                    heading: row.get(2)?,
                    text: row.get(3)?,
                    hash: row.get(4)?,
                };
                let bytes: Vec<u8> = row.get(5)?;
                Ok((chunk, bytes))
            })
            .map_err(|e| AppError::Index(format!("Failed to query chunks: {}", e)))?;

        let mut candidates = Vec::new();
        for row in rows {
            let (chunk, bytes) =
                row.map_err(|e| AppError::Index(format!("Failed to read chunk row: {}", e)))?;
            candidates.push((chunk, bytes_to_embedding(&bytes)?));
        }

        let hits = rank_hits(candidates, embedding, top_k);

        tracing::debug!("Retrieved {} chunks (requested top-{})", hits.len(), top_k);
        Ok(hits)
    }

    fn count(&self) -> AppResult<usize> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(|e| AppError::Index(format!("Failed to count chunks: {}", e)))
    }

    fn info(&self) -> AppResult<Option<IndexInfo>> {
        read_info(&*self.conn()?)
    }

    fn replace_all(&self, records: &[IndexRecord], info: &IndexInfo) -> AppResult<()> {
        for record in records {
            check_dimension(Some(info), &record.embedding)?;
        }

        let info_json = serde_json::to_string(info)
            .map_err(|e| AppError::Index(format!("Failed to serialize index metadata: {}", e)))?;

        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Index(format!("Failed to begin transaction: {}", e)))?;

        tx.execute("DELETE FROM chunks", [])
            .map_err(|e| AppError::Index(format!("Failed to delete chunks: {}", e)))?;

        for record in records {
            insert_record(&tx, record)?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)",
            params![INFO_KEY, info_json],
        )
        .map_err(|e| AppError::Index(format!("Failed to write index metadata: {}", e)))?;

        // Dropping an uncommitted transaction rolls it back
        tx.commit()
            .map_err(|e| AppError::Index(format!("Failed to commit index: {}", e)))?;

        tracing::info!(
            "Replaced index contents: {} chunks, model {} ({} dims)",
            records.len(),
            info.embedding_model,
            info.dimension
        );
        Ok(())
    }

    fn reset(&self) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute_batch("DELETE FROM chunks; DELETE FROM index_meta;")
            .map_err(|e| AppError::Index(format!("Failed to reset index: {}", e)))?;

        tracing::info!("Reset vector index");
        Ok(())
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::test_support::record;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, SqliteIndex) {
        let temp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&temp.path().join(".docqa/index.sqlite")).unwrap();
        (temp, index)
    }

    #[test]
    fn test_open_creates_empty_index() {
        let (_temp, index) = open_temp();
        assert_eq!(index.count().unwrap(), 0);
        assert!(index.info().unwrap().is_none());
    }

    #[test]
    fn test_replace_all_and_query() {
        let (_temp, index) = open_temp();
        index
            .replace_all(
                &[
                    record("vpn.md", 0, "Connect to the VPN", vec![1.0, 0.0, 0.0]),
                    record("pto.md", 0, "Vacation policy", vec![0.0, 1.0, 0.0]),
                ],
                &IndexInfo::new("text-embedding-3-small", 3),
            )
            .unwrap();

        let hits = index.query(&[0.9, 0.1, 0.0], 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id.to_string(), "vpn.md::chunk0");
        assert_eq!(hits[0].chunk.text, "Connect to the VPN");
        assert_eq!(hits[0].chunk.heading, "Intro");
        assert!(hits[0].distance < hits[1].distance);

        let info = index.info().unwrap().unwrap();
        assert_eq!(info.embedding_model, "text-embedding-3-small");
        assert_eq!(info.dimension, 3);
    }

    #[test]
    fn test_replace_all_discards_previous_contents() {
        let (_temp, index) = open_temp();
        let info = IndexInfo::new("m", 2);
        index
            .replace_all(&[record("old.md", 0, "old", vec![1.0, 0.0])], &info)
            .unwrap();
        index
            .replace_all(&[record("new.md", 0, "new", vec![1.0, 0.0])], &info)
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.document_id().as_str(), "new.md");
    }

    #[test]
    fn test_wrong_dimension_rejected_before_replacing() {
        let (_temp, index) = open_temp();
        index
            .replace_all(
                &[record("kept.md", 0, "kept", vec![1.0, 0.0])],
                &IndexInfo::new("m", 2),
            )
            .unwrap();

        // Second record has the wrong dimension
        let result = index.replace_all(
            &[
                record("a.md", 0, "a", vec![1.0, 0.0]),
                record("b.md", 0, "b", vec![1.0]),
            ],
            &IndexInfo::new("m", 2),
        );

        assert!(result.is_err());
        assert_eq!(index.count().unwrap(), 1);
    }

    #[test]
    fn test_failed_insert_rolls_back_replace() {
        let (_temp, index) = open_temp();
        index
            .replace_all(
                &[record("kept.md", 0, "kept", vec![1.0, 0.0])],
                &IndexInfo::new("old-model", 2),
            )
            .unwrap();

        // Fail the insert of the second record, after the old rows are deleted
        index
            .conn()
            .unwrap()
            .execute_batch(
                "CREATE TEMP TRIGGER reject_b BEFORE INSERT ON main.chunks
                 WHEN NEW.document_id = 'b.md'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let result = index.replace_all(
            &[
                record("a.md", 0, "a", vec![1.0, 0.0]),
                record("b.md", 0, "b", vec![0.0, 1.0]),
            ],
            &IndexInfo::new("new-model", 2),
        );

        assert!(matches!(result, Err(AppError::Index(_))));
        let hits = index.query(&[1.0, 0.0], 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.document_id().as_str(), "kept.md");
        assert_eq!(index.info().unwrap().unwrap().embedding_model, "old-model");
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");

        {
            let index = SqliteIndex::open(&path).unwrap();
            index
                .replace_all(
                    &[record("a.md", 0, "a", vec![0.5, 0.5])],
                    &IndexInfo::new("m", 2),
                )
                .unwrap();
        }

        let reopened = SqliteIndex::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        assert_eq!(reopened.info().unwrap().unwrap().embedding_model, "m");
    }

    #[test]
    fn test_upsert_keeps_position_for_ties() {
        let (_temp, index) = open_temp();
        index
            .replace_all(
                &[
                    record("first.md", 0, "one", vec![1.0, 0.0]),
                    record("second.md", 0, "two", vec![1.0, 0.0]),
                ],
                &IndexInfo::new("m", 2),
            )
            .unwrap();

        index
            .upsert(&record("first.md", 0, "one, revised", vec![1.0, 0.0]))
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].chunk.text, "one, revised");
        assert_eq!(hits[1].chunk.document_id().as_str(), "second.md");
        assert_eq!(index.count().unwrap(), 2);
    }

    #[test]
    fn test_reset() {
        let (_temp, index) = open_temp();
        index
            .replace_all(&[record("a.md", 0, "a", vec![1.0])], &IndexInfo::new("m", 1))
            .unwrap();
        index.reset().unwrap();

        assert_eq!(index.count().unwrap(), 0);
        assert!(index.info().unwrap().is_none());
    }

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let embedding = vec![0.25, -1.5, 3.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), embedding);
        assert!(bytes_to_embedding(&bytes[..5]).is_err());
    }
}
