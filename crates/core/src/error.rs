//! Error types for docqa.
//!
//! A single error enum covers the query pipeline failures (invalid input,
//! embedding, retrieval, generation, unknown documents) as well as the
//! ambient categories (configuration, I/O, index storage, prompts).

use thiserror::Error;

/// Unified error type for docqa.
///
/// Every fallible function returns `Result<T, AppError>`. Failures are
/// surfaced to the caller as-is; nothing in the pipeline retries or swallows
/// them.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad user input (blank question, out-of-range top-k)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Embedding provider unreachable or input rejected
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index empty, unreachable, or built with another model
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// LLM provider failure while generating an answer
    #[error("Generation error: {0}")]
    Generation(String),

    /// Unknown or rejected document filename
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Client exceeded its request allowance
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Vector index storage errors
    #[error("Index error: {0}")]
    Index(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category() {
        let err = AppError::RetrievalUnavailable("index is empty".to_string());
        assert_eq!(err.to_string(), "Retrieval unavailable: index is empty");
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Serialization(_)));
    }
}
