//! LLM integration crate for docqa.
//!
//! Provider-agnostic chat completion behind the [`LlmClient`] trait.
//!
//! # Providers
//! - **OpenAI**: any OpenAI-compatible chat completions endpoint (default)
//! - **Ollama**: local LLM runtime via `/api/chat`
//!
//! # Example
//! ```no_run
//! use docqa_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Where is the VPN guide?", "llama3.2")
//!     .with_system("Answer from the handbook only.")
//!     .with_temperature(0.1);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{MockLlmClient, OllamaClient, OpenAiClient};
pub use types::{ChatMessage, ProviderType};
