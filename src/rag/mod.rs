// Retrieval-augmented answering
// Small-talk bypass, context retrieval, prompt assembly and failure handling
// around a single generation call

pub mod classify;
pub mod orchestrator;
pub mod prompt;
pub mod retriever;
pub mod small_talk;

#[cfg(test)]
mod tests;

pub use classify::{FailureClassifier, FailureKind, KeywordClassifier};
pub use orchestrator::{AnswerOrchestrator, AnswerOutcome, AskRequest, QUOTA_MESSAGE};
pub use prompt::build_prompt;
pub use retriever::{RetrievedChunk, Retriever};
pub use small_talk::is_small_talk;
