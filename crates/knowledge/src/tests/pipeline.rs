//! Ingest a small handbook into an on-disk index, reopen it, and answer.

use crate::embeddings::providers::HashProvider;
use crate::embeddings::EmbeddingProvider;
use crate::index::SqliteIndex;
use crate::ingest::Ingestor;
use crate::library::DocumentLibrary;
use crate::rag::{AnswerGenerator, Retriever};
use crate::service::QaService;
use crate::types::DocumentId;
use crate::vector_index::VectorIndex;
use docqa_core::AppError;
use docqa_llm::MockLlmClient;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_handbook(docs: &Path) {
    std::fs::create_dir_all(docs.join("guides")).unwrap();

    // Five ~420 character paragraphs: too long for one chunk
    let paragraph = "Pair with your buddy on a starter ticket. ".repeat(10);
    let week_two = vec![paragraph.trim(); 5].join("\n\n");
    std::fs::write(
        docs.join("onboarding.md"),
        format!(
            "# Onboarding\n\nWelcome to the team.\n\n## Week 1\n\nSet up your laptop and request repository access.\n\n## Week 2\n\n{}",
            week_two
        ),
    )
    .unwrap();

    std::fs::write(
        docs.join("guides/testing.md"),
        "## Unit tests\n\nRun unit tests with the make test target before every push.\n\n```sh\n## not a heading\nmake test\n```",
    )
    .unwrap();
}

fn embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashProvider::new(256))
}

#[tokio::test]
async fn test_ingest_reopen_and_answer() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    let index_path = temp.path().join(".docqa/index.sqlite");
    write_handbook(&docs);

    {
        let index: Arc<dyn VectorIndex> = Arc::new(SqliteIndex::open(&index_path).unwrap());
        let stats = Ingestor::new(embedder(), index).ingest(&docs).await.unwrap();

        assert_eq!(stats.documents, 2);
        // Introduction, Week 1, Week 2 split in two, Unit tests
        assert_eq!(stats.chunks, 5);
    }

    let index: Arc<dyn VectorIndex> = Arc::new(SqliteIndex::open(&index_path).unwrap());
    assert_eq!(index.count().unwrap(), 5);

    let llm = Arc::new(MockLlmClient::replying("Run make test before pushing."));
    let service = QaService::new(
        Retriever::new(embedder(), index),
        AnswerGenerator::new(llm.clone(), "scripted"),
        DocumentLibrary::new(&docs),
    );

    let answer = service
        .query("How do I run unit tests?", Some(1))
        .await
        .unwrap();

    assert_eq!(answer.sources, vec![DocumentId::new("guides/testing.md")]);
    assert!(answer.retrieval.chunks[0]
        .chunk
        .text
        .starts_with("Testing — Unit tests\n\n"));

    let system = llm.requests()[0].system.clone().unwrap();
    assert!(system.contains("[Source: guides/testing.md]"));
}

#[tokio::test]
async fn test_week_two_chunks_share_prefix() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    write_handbook(&docs);

    let index: Arc<dyn VectorIndex> =
        Arc::new(SqliteIndex::open(&temp.path().join("index.sqlite")).unwrap());
    Ingestor::new(embedder(), index.clone()).ingest(&docs).await.unwrap();

    let hits = Retriever::new(embedder(), index)
        .retrieve("starter ticket buddy", 5)
        .await
        .unwrap();

    let week_two: Vec<_> = hits
        .chunks
        .iter()
        .filter(|c| c.chunk.heading == "Week 2")
        .collect();

    assert_eq!(week_two.len(), 2);
    for scored in week_two {
        assert!(scored.chunk.text.starts_with("Onboarding — Week 2\n\n"));
        assert!(scored.chunk.text.chars().count() <= 1500);
    }
}

#[tokio::test]
async fn test_switching_embedding_model_requires_reingest() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    write_handbook(&docs);

    let index: Arc<dyn VectorIndex> =
        Arc::new(SqliteIndex::open(&temp.path().join("index.sqlite")).unwrap());
    Ingestor::new(embedder(), index.clone()).ingest(&docs).await.unwrap();

    let retriever = Retriever::new(Arc::new(HashProvider::new(64)), index);
    assert!(matches!(
        retriever.retrieve("unit tests", 3).await,
        Err(AppError::RetrievalUnavailable(_))
    ));
}
