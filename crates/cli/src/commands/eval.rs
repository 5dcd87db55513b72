//! Eval command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::{evaluate, load_cases, EvalReport, QaService};
use std::path::PathBuf;

/// Measure retrieval quality against labelled questions
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// YAML file with `cases: [{question, expected_doc}]`
    pub cases: PathBuf,

    /// Number of chunks retrieved per question
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EvalCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;
        tracing::info!("Executing eval command with {:?}", self.cases);

        let cases = load_cases(&self.cases)?;
        let service = QaService::from_config(config)?;
        let report = evaluate(service.retriever(), &cases, self.top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_table(&report);
        }

        Ok(())
    }
}

fn print_table(report: &EvalReport) {
    let q_width = report
        .outcomes
        .iter()
        .map(|o| o.question.chars().count())
        .max()
        .unwrap_or(0)
        .max("Question".len());
    let doc_width = report
        .outcomes
        .iter()
        .map(|o| o.expected_doc.chars().count())
        .max()
        .unwrap_or(0)
        .max("Expected Doc".len());

    let header = format!(
        "{:<q_width$}  {:<doc_width$}  Hit  Rank",
        "Question", "Expected Doc"
    );
    let rule = "-".repeat(header.len());

    println!("{}", header);
    println!("{}", rule);
    for outcome in &report.outcomes {
        let mark = if outcome.hit { "Y" } else { "N" };
        let rank = outcome
            .rank
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<q_width$}  {:<doc_width$}  {:>3}  {:>4}",
            outcome.question, outcome.expected_doc, mark, rank
        );
    }
    println!("{}", rule);
    println!(
        "Precision@{}: {:.0}% ({}/{})",
        report.top_k,
        report.precision_at_k * 100.0,
        report.hits,
        report.outcomes.len()
    );
}
