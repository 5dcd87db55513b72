//! Embedding provider implementations.

pub mod hash;
pub mod ollama;
pub mod openai;

pub use hash::HashProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
