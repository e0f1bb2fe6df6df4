
use std::sync::LazyLock;

use fancy_regex::Regex;

pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 3000;

pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant. Answer concisely and only using the provided context. \
If the answer is not present in the context, say: 'I don't know based on the provided documents.' \
When you include information from the context, provide short citations in the form [source_name].";

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Normalize line endings, cap blank runs at one empty line and trim
#[inline]
pub fn sanitize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = EXCESS_NEWLINES
        .try_replacen(&unified, 0, "\n\n")
        .map_or_else(|_| unified.clone(), |c| c.into_owned());
    collapsed.trim().to_string()
}

/// Keep the last `max_chars` characters of `text`
///
/// When the first line break of the kept tail falls inside its first tenth,
/// everything up to and including that break is dropped so the context does
/// not open mid-paragraph.
#[inline]
pub fn tail_truncate(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let tail: String = text.chars().skip(total - max_chars).collect();
    match tail.chars().position(|c| c == '\n') {
        Some(pos) if pos > 0 && pos < max_chars / 10 => tail.chars().skip(pos + 1).collect(),
        _ => tail,
    }
}

/// Assemble the full prompt sent for a context-grounded answer
#[inline]
pub fn build_prompt(
    question: &str,
    context: &str,
    instructions: Option<&str>,
    max_context_chars: usize,
) -> String {
    let instructions = instructions
        .filter(|i| !i.trim().is_empty())
        .unwrap_or(DEFAULT_INSTRUCTIONS);
    let question = sanitize(question);
    let context = tail_truncate(&sanitize(context), max_context_chars);

    format!(
        "System instructions:
{instructions}

Context (only use the information below to answer). If context is empty, say you don't know.
--- CONTEXT START ---
{context}
--- CONTEXT END ---


User question:
{question}

Answer (be concise). If you must add assumptions, label them clearly with \"Assumption:\".
"
    )
}
