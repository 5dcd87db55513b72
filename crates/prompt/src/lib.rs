//! Prompt system for docqa.
//!
//! - YAML prompt definitions under `.docqa/prompts/<id>.yml`
//! - Built-in defaults used when no override file exists
//! - Handlebars rendering of the system instruction and user message

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

pub use builder::build_prompt;
pub use defaults::{default_answer_prompt, ANSWER_PROMPT_ID, NO_ANSWER_SENTINEL};
pub use loader::{load_prompt, load_prompt_or_default};
pub use types::{BuiltPrompt, PromptDefinition};
