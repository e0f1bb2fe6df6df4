#[cfg(test)]
mod tests;

use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, warn};

use crate::database::{Chunk, IndexService};
use crate::embeddings::Embedder;
use crate::{DocsError, Result};

pub const DEFAULT_TOP_K: usize = 5;

/// One search hit, nearest first in a result list
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub slot: usize,
    pub chunk: Chunk,
    pub distance: f32,
}

/// Turns a query into the nearest stored chunks
#[derive(Clone)]
pub struct Retriever {
    index: Arc<IndexService>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    #[inline]
    pub fn new(index: Arc<IndexService>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    /// Nearest `k` chunks for `query`
    ///
    /// An empty or unreadable index yields no hits rather than an error.
    /// Every lookup in one call uses the same snapshot.
    #[inline]
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        self.index.check_embedder(self.embedder.as_ref())?;

        let snapshot = match self.index.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(DocsError::IndexUnavailable(reason)) => {
                warn!("Index unavailable, answering without context: {}", reason);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        if snapshot.is_empty() || k == 0 {
            debug!("Index is empty, skipping retrieval");
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;
        let hits = snapshot.index().search(&query_vector, k)?;

        let results: Vec<RetrievedChunk> = hits
            .into_iter()
            .filter_map(|(slot, distance)| match snapshot.store().get(slot) {
                Ok(chunk) => Some(RetrievedChunk {
                    slot,
                    chunk: chunk.clone(),
                    distance,
                }),
                Err(e) => {
                    warn!("Skipping search hit: {}", e);
                    None
                }
            })
            .filter(|hit| !hit.chunk.text.is_empty())
            .collect();

        debug!("Retrieved {} chunks for query", results.len());
        Ok(results)
    }

    /// Nearest chunks rendered as one context block
    #[inline]
    pub async fn retrieve_context(&self, query: &str, k: usize) -> Result<String> {
        let hits = self.retrieve(query, k).await?;
        Ok(format_context(&hits))
    }
}

/// `[source: file] text` per hit, separated by blank lines
#[inline]
pub fn format_context(hits: &[RetrievedChunk]) -> String {
    hits.iter()
        .map(|hit| format!("[source: {}] {}", hit.chunk.source_file, hit.chunk.text))
        .join("\n\n")
}
