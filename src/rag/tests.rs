use super::*;
use crate::generation::GenerationError;

#[test]
fn small_talk_matches_vocabulary_exactly() {
    for greeting in ["hi", "Hello", "  HEY  ", "hi there", "What's Up", "👋", "😊\n"] {
        assert!(is_small_talk(greeting), "{greeting:?} should be small talk");
    }
}

#[test]
fn small_talk_rejects_near_misses() {
    for text in [
        "hi!",
        "hello world",
        "hey, how do I install it?",
        "hii",
        "",
        "   ",
        "good afternoon",
    ] {
        assert!(!is_small_talk(text), "{text:?} should not be small talk");
    }
}

#[test]
fn keyword_classifier_detects_quota() {
    let classifier = KeywordClassifier;
    for message in [
        "HTTP 429: Too Many Requests",
        "Quota exceeded for project",
        "RESOURCE_EXHAUSTED: QUOTA",
        "daily quota reached",
    ] {
        assert_eq!(
            classifier.classify(&GenerationError::new(message)),
            FailureKind::Quota,
            "{message}"
        );
    }
}

#[test]
fn keyword_classifier_treats_everything_else_as_other() {
    let classifier = KeywordClassifier;
    for message in ["HTTP 500: internal error", "connection refused", ""] {
        assert_eq!(
            classifier.classify(&GenerationError::new(message)),
            FailureKind::Other,
            "{message}"
        );
    }
}

#[test]
fn keyword_classifier_matches_429_as_substring() {
    assert_eq!(
        KeywordClassifier.classify(&GenerationError::new("request id 54290 failed")),
        FailureKind::Quota
    );
}
