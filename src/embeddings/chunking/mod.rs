
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for content chunking, measured in characters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window length
    pub chunk_size: usize,
    /// Characters shared between neighbouring windows
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl ChunkingConfig {
    /// Chunk `text` with this configuration
    #[inline]
    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk_text(text, self.chunk_size, self.chunk_overlap)
    }
}

/// Split `text` into trimmed, non-empty windows of `size` characters that
/// advance by `size - overlap` characters.
///
/// Offsets are counted in `char`s, so multi-byte text is never split inside a
/// code point. The advance is clamped to at least one character, which keeps
/// the loop finite when `overlap >= size`. Iteration stops at the first window
/// that reaches the end of the text.
#[inline]
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let size = size.max(1);
    let chars: Vec<char> = text.chars().collect();

    if chars.len() <= size {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if end == chars.len() {
            break;
        }
        start += step;
    }

    debug!(
        "Chunked {} chars into {} chunks (size {}, step {})",
        chars.len(),
        chunks.len(),
        size,
        step
    );

    chunks
}
