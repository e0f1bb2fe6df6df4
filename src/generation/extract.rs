// Pull the answer text out of a completion response
//
// Services disagree on where the text lives, so each known shape gets a typed
// attempt and the first one that matches wins.

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use super::GenerationError;

type Extractor = fn(&Value) -> Option<String>;

const EXTRACTORS: [(&str, Extractor); 5] = [
    ("ollama generate", ollama_generate),
    ("ollama chat", ollama_chat),
    ("gemini", gemini),
    ("answer field", answer_field),
    ("bare string", bare_string),
];

#[derive(Deserialize)]
struct OllamaGenerate {
    response: String,
}

#[derive(Deserialize)]
struct OllamaChat {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

/// Find the answer text in `value`
#[inline]
pub fn extract_text(value: &Value) -> Result<String, GenerationError> {
    EXTRACTORS
        .iter()
        .find_map(|(name, extract)| {
            extract(value).inspect(|_| trace!("Extracted answer as {}", name))
        })
        .ok_or_else(|| {
            GenerationError::new(format!(
                "Unrecognised response shape: {}",
                preview(value)
            ))
        })
}

fn ollama_generate(value: &Value) -> Option<String> {
    OllamaGenerate::deserialize(value).ok().map(|r| r.response)
}

fn ollama_chat(value: &Value) -> Option<String> {
    OllamaChat::deserialize(value).ok().map(|r| r.message.content)
}

fn gemini(value: &Value) -> Option<String> {
    let response = GeminiResponse::deserialize(value).ok()?;
    let parts = &response.candidates.first()?.content.as_ref()?.parts;
    let texts: Vec<&str> = parts.iter().filter_map(|p| p.text.as_deref()).collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    }
}

fn answer_field(value: &Value) -> Option<String> {
    match value.get("answer")? {
        Value::String(text) => Some(text.clone()),
        nested @ Value::Object(_) => answer_field(nested),
        _ => None,
    }
}

fn bare_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 200 {
        format!("{}...", text.chars().take(200).collect::<String>())
    } else {
        text
    }
}
