//! Retrieve command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::QaService;

/// Show the chunks retrieved for a question, without generating an answer
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Query text
    pub query: String,

    /// Number of chunks to retrieve (default from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;
        tracing::info!("Executing retrieve command");

        let service = QaService::from_config(config)?;
        let hits = service.debug_retrieve(&self.query, self.top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&hits)?);
            return Ok(());
        }

        for (i, hit) in hits.iter().enumerate() {
            println!(
                "{}. [{:.4}] {} ({})",
                i + 1,
                hit.score,
                hit.chunk_id,
                hit.heading
            );
            println!("   {}", hit.preview.replace('\n', " "));
        }

        Ok(())
    }
}
