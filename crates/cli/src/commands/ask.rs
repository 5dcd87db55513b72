//! Ask command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::QaService;

/// Answer a question from the docs
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of chunks to retrieve (default from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Also print the retrieved chunks
    #[arg(long)]
    pub show_chunks: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;
        tracing::info!("Executing ask command");

        let service = QaService::from_config(config)?;
        let answer = service.query(&self.question, self.top_k).await?;

        if self.json {
            let output = serde_json::json!({
                "answer": answer.text,
                "sources": answer.sources,
                "chunks": answer.retrieval.chunks.iter().map(|c| serde_json::json!({
                    "chunkId": c.chunk.id.to_string(),
                    "score": c.score,
                    "text": c.chunk.text,
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{}", answer.text);

        if !answer.sources.is_empty() {
            println!("\nSources:");
            for source in &answer.sources {
                println!("  - {}", source);
            }
        }

        if self.show_chunks {
            println!("\nRetrieved chunks:");
            for (i, scored) in answer.retrieval.chunks.iter().enumerate() {
                println!("  {}. [{:.4}] {}", i + 1, scored.score, scored.chunk.id);
            }
        }

        Ok(())
    }
}
