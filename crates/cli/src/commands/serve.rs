//! Serve command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::QaService;

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Bind address (default from config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (default from config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Disable per-client rate limiting
    #[arg(long)]
    pub no_rate_limit: bool,
}

impl ServeCommand {
    pub async fn execute(&self, mut config: AppConfig) -> AppResult<()> {
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.no_rate_limit {
            config.server.rate_limit.enabled = false;
        }

        config.validate()?;

        let service = QaService::from_config(&config)?;
        docqa_server::serve(&config, service).await
    }
}
