//! Command handlers for the docqa CLI.
//!
//! One submodule per subcommand.

pub mod ask;
pub mod docs;
pub mod eval;
pub mod ingest;
pub mod retrieve;
pub mod serve;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use docs::DocsCommand;
pub use eval::EvalCommand;
pub use ingest::IngestCommand;
pub use retrieve::RetrieveCommand;
pub use serve::ServeCommand;
