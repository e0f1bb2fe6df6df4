
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use super::classify::{FailureClassifier, FailureKind, KeywordClassifier};
use super::prompt::{DEFAULT_MAX_CONTEXT_CHARS, build_prompt};
use super::retriever::{DEFAULT_TOP_K, Retriever};
use super::small_talk::is_small_talk;
use crate::config::Config;
use crate::generation::{GenerationError, Generator};
use crate::{DocsError, Result};

pub const QUOTA_MESSAGE: &str =
    "Generation API quota exhausted. Please try again later or upgrade your plan.";

const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Final state of one answer request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Answered(String),
    QuotaExceeded(String),
    Failed(String),
}

impl AnswerOutcome {
    #[inline]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Answered(_) => 200,
            Self::QuotaExceeded(_) => 429,
            Self::Failed(_) => 400,
        }
    }

    #[inline]
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }

    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Self::Answered(text) | Self::QuotaExceeded(text) | Self::Failed(text) => text,
        }
    }

    /// JSON body for an HTTP caller
    #[inline]
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Answered(answer) => json!({ "answer": answer }),
            Self::QuotaExceeded(message) => json!({ "error": "RATE_LIMIT", "message": message }),
            Self::Failed(message) => json!({ "error": "GENERATION_FAILED", "message": message }),
        }
    }

    #[inline]
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Answered(answer) => Ok(answer),
            Self::QuotaExceeded(message) => Err(DocsError::GenerationQuotaExceeded(message)),
            Self::Failed(message) => Err(DocsError::GenerationFailure(message)),
        }
    }
}

/// Incoming question as sent by a chat client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    pub question: String,
}

impl AskRequest {
    /// Take the first non-empty string among `query`, `question` and `message`
    #[inline]
    pub fn from_value(value: &Value) -> Self {
        let question = ["query", "question", "message"]
            .iter()
            .filter_map(|field| value.get(field).and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .unwrap_or_default()
            .to_string();

        Self { question }
    }
}

/// Small talk goes straight to the generator; everything else is answered
/// from retrieved context. Each request makes one generation attempt.
pub struct AnswerOrchestrator {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    classifier: Arc<dyn FailureClassifier>,
    top_k: usize,
    max_context_chars: usize,
    instructions: Option<String>,
    timeout: Duration,
}

impl AnswerOrchestrator {
    #[inline]
    pub fn new(retriever: Retriever, generator: Arc<dyn Generator>) -> Self {
        Self {
            retriever,
            generator,
            classifier: Arc::new(KeywordClassifier),
            top_k: DEFAULT_TOP_K,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            instructions: None,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// Orchestrator using the retrieval and timeout settings from `config`
    #[inline]
    pub fn from_config(
        config: &Config,
        retriever: Retriever,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self::new(retriever, generator)
            .with_top_k(config.retrieval.top_k)
            .with_max_context_chars(config.retrieval.max_context_chars)
            .with_timeout(config.generation.timeout())
    }

    #[inline]
    pub fn with_classifier(mut self, classifier: Arc<dyn FailureClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[inline]
    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    #[inline]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    pub async fn answer_request(&self, request: &AskRequest) -> AnswerOutcome {
        self.answer(&request.question).await
    }

    #[inline]
    pub async fn answer(&self, question: &str) -> AnswerOutcome {
        if is_small_talk(question) {
            debug!("Small talk detected, skipping retrieval");
            return self.generate(question).await;
        }

        let context = match self.retriever.retrieve_context(question, self.top_k).await {
            Ok(context) => context,
            Err(e) => {
                error!("Retrieval failed: {}", e);
                return AnswerOutcome::Failed(failure_message(&e));
            }
        };

        let prompt = build_prompt(
            question,
            &context,
            self.instructions.as_deref(),
            self.max_context_chars,
        );
        debug!(
            "Built prompt with {} context chars",
            context.chars().count()
        );

        self.generate(&prompt).await
    }

    async fn generate(&self, prompt: &str) -> AnswerOutcome {
        let result = tokio::time::timeout(self.timeout, self.generator.generate(prompt))
            .await
            .unwrap_or_else(|_| {
                Err(GenerationError::new(format!(
                    "Generation timed out after {:?}",
                    self.timeout
                )))
            });

        match result {
            Ok(answer) => {
                info!("Generated answer with {}", self.generator.name());
                AnswerOutcome::Answered(answer)
            }
            Err(e) => match self.classifier.classify(&e) {
                FailureKind::Quota => {
                    warn!("Generation quota exhausted: {}", e);
                    AnswerOutcome::QuotaExceeded(QUOTA_MESSAGE.to_string())
                }
                FailureKind::Other => {
                    error!("Generation failed: {}", e);
                    AnswerOutcome::Failed(failure_message(&e))
                }
            },
        }
    }
}

fn failure_message(error: &dyn std::fmt::Display) -> String {
    format!("RAG pipeline failed: {error}")
}
