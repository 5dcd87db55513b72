//! Grounded answer generation.
//!
//! Retrieved chunks become a bounded context block, the answer prompt is
//! rendered around it, and one LLM call produces the answer. Citations are
//! the documents that made it into the context, whatever the model says.

use crate::rag::types::{Answer, RetrievalResult};
use crate::types::DocumentId;
use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest};
use docqa_prompt::{build_prompt, default_answer_prompt, PromptDefinition, NO_ANSWER_SENTINEL};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 8000;

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Context handed to the model, plus the documents it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextBlock {
    pub text: String,
    pub sources: Vec<DocumentId>,
    pub chunks_used: usize,
}

/// Render chunks in retrieval order as `[Source: doc]\ntext` blocks.
///
/// Chunks are appended while the block stays within `max_chars`
/// characters; the first chunk is always included.
pub fn build_context(retrieval: &RetrievalResult, max_chars: usize) -> ContextBlock {
    let mut text = String::new();
    let mut length = 0;
    let mut sources: Vec<DocumentId> = Vec::new();
    let mut chunks_used = 0;

    for scored in &retrieval.chunks {
        let block = format!("[Source: {}]\n{}", scored.document_id(), scored.chunk.text);
        let block_len = block.chars().count();

        if chunks_used > 0 {
            let next_len = length + CONTEXT_SEPARATOR.len() + block_len;
            if next_len > max_chars {
                break;
            }
            text.push_str(CONTEXT_SEPARATOR);
            length += CONTEXT_SEPARATOR.len();
        }

        text.push_str(&block);
        length += block_len;
        chunks_used += 1;

        if !sources.contains(scored.document_id()) {
            sources.push(scored.document_id().clone());
        }
    }

    ContextBlock {
        text,
        sources,
        chunks_used,
    }
}

/// Turns a question and its retrieval into a cited answer.
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_context_chars: usize,
    prompt: PromptDefinition,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            prompt: default_answer_prompt(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    /// Use a workspace override of the answer prompt.
    pub fn with_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = prompt;
        self
    }

    /// Generate an answer for `query` from `retrieval`.
    ///
    /// An empty retrieval yields the no-answer sentinel without calling the
    /// model. Provider failures are `Generation` errors.
    #[instrument(skip(self, retrieval), fields(chunks = retrieval.len(), model = %self.model))]
    pub async fn generate(&self, query: &str, retrieval: RetrievalResult) -> AppResult<Answer> {
        if retrieval.is_empty() {
            tracing::info!("No chunks retrieved, answering with the no-answer sentinel");
            return Ok(Answer {
                text: NO_ANSWER_SENTINEL.to_string(),
                sources: Vec::new(),
                retrieval,
            });
        }

        let context = build_context(&retrieval, self.max_context_chars);
        tracing::debug!(
            "Context uses {} of {} chunks ({} chars)",
            context.chunks_used,
            retrieval.len(),
            context.text.chars().count()
        );

        let mut variables = HashMap::new();
        variables.insert("context".to_string(), context.text.clone());
        variables.insert("question".to_string(), query.to_string());
        variables.insert("sentinel".to_string(), NO_ANSWER_SENTINEL.to_string());

        let built = build_prompt(&self.prompt, &variables)
            .map_err(|e| AppError::Generation(format!("Failed to build answer prompt: {}", e)))?;

        let mut request =
            LlmRequest::new(built.user, self.model.as_str()).with_temperature(self.temperature);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.llm.complete(&request).await.map_err(|e| match e {
            AppError::Generation(_) => e,
            other => AppError::Generation(other.to_string()),
        })?;

        tracing::info!(
            "Generated answer with {} ({} sources)",
            self.llm.provider_name(),
            context.sources.len()
        );

        Ok(Answer {
            text: response.content.trim().to_string(),
            sources: context.sources,
            retrieval,
        })
    }
}
