//! Docs command handler.

use clap::{Args, Subcommand};
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::DocumentLibrary;

/// List or print documents
#[derive(Args, Debug)]
pub struct DocsCommand {
    #[command(subcommand)]
    pub action: DocsAction,
}

#[derive(Subcommand, Debug)]
pub enum DocsAction {
    /// List markdown files in the docs directory
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a document's raw markdown
    Show {
        /// Filename, e.g. onboarding.md
        filename: String,
    },
}

impl DocsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let library = DocumentLibrary::new(config.docs_path());

        match self.action {
            DocsAction::List { json } => {
                let names = library.list()?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&names)?);
                } else if names.is_empty() {
                    println!("No documents in {}", library.root().display());
                } else {
                    for name in names {
                        println!("{}", name);
                    }
                }
            }
            DocsAction::Show { ref filename } => {
                let document = library.get(filename)?;
                print!("{}", document.body);
                if !document.body.ends_with('\n') {
                    println!();
                }
            }
        }

        Ok(())
    }
}
