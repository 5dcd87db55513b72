//! LLM provider implementations.

pub mod mock;
pub mod ollama;
pub mod openai;

pub use mock::MockLlmClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use docqa_core::{AppError, AppResult};
use std::time::Duration;

/// Default request timeout for provider calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client shared by the providers.
pub(crate) fn http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Generation(format!("Failed to build HTTP client: {}", e)))
}

/// Read an error body for inclusion in a provider error message.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}
