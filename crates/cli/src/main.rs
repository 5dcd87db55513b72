//! docqa CLI
//!
//! Main entry point for the docqa command-line tool: build the document
//! index, ask questions against it, and serve the HTTP API.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, DocsCommand, EvalCommand, IngestCommand, RetrieveCommand, ServeCommand,
};
use docqa_core::{
    config::AppConfig,
    logging::{self, LogFormat},
    AppResult,
};
use std::path::PathBuf;

/// docqa - grounded question answering over internal markdown docs
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Grounded question answering over internal markdown docs", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Markdown docs directory (relative to the workspace)
    #[arg(long, global = true)]
    docs_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the index from the docs directory
    Ingest(IngestCommand),

    /// Answer a question from the docs
    Ask(AskCommand),

    /// Show the chunks retrieved for a question
    Retrieve(RetrieveCommand),

    /// List or print documents
    Docs(DocsCommand),

    /// Run the HTTP API
    Serve(ServeCommand),

    /// Measure retrieval quality against labelled questions
    Eval(EvalCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ingest(_) => "ingest",
            Commands::Ask(_) => "ask",
            Commands::Retrieve(_) => "retrieve",
            Commands::Docs(_) => "docs",
            Commands::Serve(_) => "serve",
            Commands::Eval(_) => "eval",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults, config file and environment, then CLI overrides
    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.docs_dir,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    let log_format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init_logging(config.log_level.as_deref(), config.no_color, log_format)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Docs: {:?}", config.docs_path());
    tracing::debug!("Index: {:?}", config.index_file());

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Docs(cmd) => cmd.execute(&config),
        Commands::Serve(cmd) => cmd.execute(config).await,
        Commands::Eval(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
