//! Retrieval evaluation against hand-labelled questions.
//!
//! Each case names the document that should answer its question. A case
//! is a hit when that document appears anywhere in the top-k results.

use crate::rag::Retriever;
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A question and the document expected to answer it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    pub question: String,
    pub expected_doc: String,
}

#[derive(Debug, Deserialize)]
struct EvalFile {
    cases: Vec<EvalCase>,
}

/// Outcome of one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalOutcome {
    pub question: String,
    pub expected_doc: String,
    pub hit: bool,

    /// 1-based rank of the first chunk from the expected document
    pub rank: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalReport {
    pub top_k: usize,
    pub outcomes: Vec<EvalOutcome>,
    pub hits: usize,
    pub precision_at_k: f64,
}

/// Load cases from a YAML file of the form `cases: [{question, expected_doc}]`.
pub fn load_cases(path: &Path) -> AppResult<Vec<EvalCase>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Failed to read eval cases {}: {}", path.display(), e))
    })?;

    let file: EvalFile = serde_yaml::from_str(&content)?;
    if file.cases.is_empty() {
        return Err(AppError::Config(format!(
            "No eval cases in {}",
            path.display()
        )));
    }

    Ok(file.cases)
}

/// Run every case through the retriever. Any retrieval failure aborts the
/// evaluation.
pub async fn evaluate(retriever: &Retriever, cases: &[EvalCase], top_k: usize) -> AppResult<EvalReport> {
    if cases.is_empty() {
        return Err(AppError::Config("No eval cases to run".to_string()));
    }

    let mut outcomes = Vec::with_capacity(cases.len());

    for case in cases {
        let result = retriever.retrieve(&case.question, top_k).await?;
        let rank = result
            .document_ids()
            .iter()
            .position(|id| id.as_str() == case.expected_doc)
            .map(|i| i + 1);

        tracing::debug!(
            "Eval '{}': expected {} at rank {:?}",
            case.question,
            case.expected_doc,
            rank
        );

        outcomes.push(EvalOutcome {
            question: case.question.clone(),
            expected_doc: case.expected_doc.clone(),
            hit: rank.is_some(),
            rank,
        });
    }

    let hits = outcomes.iter().filter(|o| o.hit).count();
    let precision_at_k = hits as f64 / outcomes.len() as f64;

    tracing::info!(
        "Precision@{}: {:.0}% ({}/{})",
        top_k,
        precision_at_k * 100.0,
        hits,
        outcomes.len()
    );

    Ok(EvalReport {
        top_k,
        outcomes,
        hits,
        precision_at_k,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::HashProvider;
    use crate::embeddings::EmbeddingProvider;
    use crate::ingest::Ingestor;
    use crate::vector_index::{MemoryIndex, VectorIndex};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn retriever(temp: &TempDir) -> Retriever {
        let docs = temp.path();
        std::fs::write(
            docs.join("pull-request-checklist.md"),
            "## Opening a pull request\n\nRebase, run the tests, then open the pull request for review.",
        )
        .unwrap();
        std::fs::write(
            docs.join("onboarding.md"),
            "## Development environment\n\nInstall the toolchain and clone the monorepo.",
        )
        .unwrap();

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashProvider::new(256));
        let index: Arc<dyn VectorIndex> = Arc::new(MemoryIndex::new());
        Ingestor::new(embedder.clone(), index.clone())
            .ingest(docs)
            .await
            .unwrap();

        Retriever::new(embedder, index)
    }

    #[test]
    fn test_load_cases() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cases.yaml");
        std::fs::write(
            &path,
            "cases:\n  - question: How do I open a pull request?\n    expected_doc: pull-request-checklist.md\n",
        )
        .unwrap();

        let cases = load_cases(&path).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].expected_doc, "pull-request-checklist.md");
    }

    #[test]
    fn test_load_cases_errors() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            load_cases(&temp.path().join("missing.yaml")),
            Err(AppError::Config(_))
        ));

        let empty = temp.path().join("empty.yaml");
        std::fs::write(&empty, "cases: []\n").unwrap();
        assert!(matches!(load_cases(&empty), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_evaluate_hits_and_misses() {
        let temp = TempDir::new().unwrap();
        let retriever = retriever(&temp).await;

        let cases = vec![
            EvalCase {
                question: "How do I open a pull request?".to_string(),
                expected_doc: "pull-request-checklist.md".to_string(),
            },
            EvalCase {
                question: "Where is the cafeteria?".to_string(),
                expected_doc: "facilities.md".to_string(),
            },
        ];

        let report = evaluate(&retriever, &cases, 1).await.unwrap();

        assert_eq!(report.hits, 1);
        assert_eq!(report.outcomes[0].rank, Some(1));
        assert!(report.outcomes[0].hit);
        assert!(!report.outcomes[1].hit);
        assert_eq!(report.outcomes[1].rank, None);
        assert!((report.precision_at_k - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_evaluate_propagates_invalid_top_k() {
        let temp = TempDir::new().unwrap();
        let retriever = retriever(&temp).await;
        let cases = vec![EvalCase {
            question: "anything".to_string(),
            expected_doc: "onboarding.md".to_string(),
        }];

        assert!(matches!(
            evaluate(&retriever, &cases, 0).await,
            Err(AppError::InvalidQuery(_))
        ));
    }
}
