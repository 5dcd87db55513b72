//! Ingest command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::ingestor_from_config;

/// Rebuild the index from the docs directory
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;
        config.ensure_state_dir()?;

        let docs_dir = config.docs_path();
        tracing::info!("Executing ingest command for {:?}", docs_dir);

        let stats = ingestor_from_config(config)?.ingest(&docs_dir).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Indexed {} documents ({} chunks, {} bytes) with {} in {:.2}s",
                stats.documents,
                stats.chunks,
                stats.bytes,
                stats.embedding_model,
                stats.duration_secs
            );
            println!("Index: {}", config.index_file().display());
        }

        Ok(())
    }
}
