use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocsError>;

#[derive(Error, Debug)]
pub enum DocsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(
        "Index was built with embedding model '{indexed}' but '{configured}' is configured; re-ingest or switch models"
    )]
    ModelMismatch { indexed: String, configured: String },

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("No chunk stored at slot {0}")]
    NotFound(usize),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Failed to load {}: {reason}", path.display())]
    Loader { path: PathBuf, reason: String },

    #[error("Generation quota exceeded: {0}")]
    GenerationQuotaExceeded(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod generation;
pub mod indexer;
pub mod loaders;
pub mod rag;
