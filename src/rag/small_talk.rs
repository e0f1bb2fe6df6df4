/// Greetings answered without touching the index
const VOCABULARY: [&str; 18] = [
    "hi",
    "hello",
    "hey",
    "yo",
    "hola",
    "hi there",
    "good morning",
    "good evening",
    "how are you",
    "what's up",
    "sup",
    "hey bro",
    "hey buddy",
    "hey man",
    "hi buddy",
    "👋",
    "🙂",
    "😊",
];

/// Exact match after trimming and lowercasing; no fuzzy or partial matches
#[inline]
pub fn is_small_talk(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    VOCABULARY.contains(&normalized.as_str())
}
