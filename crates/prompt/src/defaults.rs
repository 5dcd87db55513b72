//! Built-in prompt definitions.

use crate::types::PromptDefinition;

/// Identifier of the answer prompt. An override lives at
/// `.docqa/prompts/docqa.answer.yml`.
pub const ANSWER_PROMPT_ID: &str = "docqa.answer";

/// Reply the model is told to give when the context is insufficient.
pub const NO_ANSWER_SENTINEL: &str = "I don't know based on the available documentation.";

const ANSWER_SYSTEM: &str = r#"You are an internal documentation assistant. Answer the user's question using ONLY the provided context below. Do not use any prior knowledge.

If the context does not contain enough information to answer the question, respond with: "{{sentinel}}"

Be concise and direct. Cite the source document when possible.

Context:
{{context}}"#;

/// The grounded-answer prompt.
///
/// Variables: `context` (the assembled context block), `question`,
/// `sentinel`.
pub fn default_answer_prompt() -> PromptDefinition {
    PromptDefinition {
        id: ANSWER_PROMPT_ID.to_string(),
        title: "Answer from documentation".to_string(),
        api_version: "1.0".to_string(),
        created_by: "docqa".to_string(),
        system: Some(ANSWER_SYSTEM.to_string()),
        template: "{{question}}".to_string(),
    }
}
