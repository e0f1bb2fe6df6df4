// Embeddings module
// Text chunking plus the pluggable embedding model behind `Embedder`

pub mod chunking;
pub mod ollama;

use async_trait::async_trait;

pub use chunking::{ChunkingConfig, chunk_text};
pub use ollama::OllamaClient;

use crate::Result;

/// Maps text to fixed-dimension vectors.
///
/// The model behind an implementation must stay the same for the lifetime of a
/// persisted index; [`Embedder::model_id`] is recorded next to the index so a
/// swap can be detected on load.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the model producing the vectors
    fn model_id(&self) -> &str;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts; the output has one vector per input, in input order
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
