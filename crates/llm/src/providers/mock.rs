//! Scripted LLM client for tests and offline runs.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docqa_core::{AppError, AppResult};
use std::sync::Mutex;

/// LLM client that answers every request with a fixed reply and keeps the
/// requests it received.
#[derive(Debug)]
pub struct MockLlmClient {
    reply: Result<String, String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    /// Client that always replies with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Client whose every call fails with a generation error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Number of completion calls made.
    pub fn call_count(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match self.reply {
            Ok(ref content) => Ok(LlmResponse {
                content: content.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            Err(ref message) => Err(AppError::Generation(message.clone())),
        }
    }
}
