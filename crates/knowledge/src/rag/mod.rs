//! Retrieval-augmented answering.
//!
//! [`Retriever`] ranks indexed chunks for a question; [`AnswerGenerator`]
//! turns that ranking into a grounded, cited answer.

pub mod generator;
pub mod retriever;
pub mod types;

pub use generator::{build_context, AnswerGenerator, ContextBlock};
pub use retriever::Retriever;
pub use types::{Answer, DebugHit, RetrievalResult, ScoredChunk};
