use crate::generation::GenerationError;

/// How a generation failure should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Quota,
    Other,
}

/// Decides whether a generation failure means the service is rate limited
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, error: &GenerationError) -> FailureKind;
}

/// Looks for `429` anywhere, or `quota` in any letter case, in the message
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl FailureClassifier for KeywordClassifier {
    fn classify(&self, error: &GenerationError) -> FailureKind {
        let message = error.message();
        if message.contains("429") || message.to_lowercase().contains("quota") {
            FailureKind::Quota
        } else {
            FailureKind::Other
        }
    }
}
