// Database module
// Flat vector index plus slot-addressed chunk store, persisted as a JSON pair
// and shared with readers as immutable snapshots

pub mod document_store;
pub mod vector_index;


use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

pub use document_store::{Chunk, DocumentStore};
pub use vector_index::VectorIndex;

use crate::config::Config;
use crate::embeddings::Embedder;
use crate::{DocsError, Result};

pub const VECTORS_FILE: &str = "vectors.json";
pub const DOCUMENTS_FILE: &str = "documents.json";
pub(crate) const FORMAT_VERSION: u32 = 1;

/// Identity shared by both persisted artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub generation: u64,
    pub model: String,
}

/// Immutable pairing of vectors and chunks; slot `i` in one is slot `i` in the other
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    meta: SnapshotMeta,
    index: VectorIndex,
    store: DocumentStore,
}

impl IndexSnapshot {
    #[inline]
    pub fn empty(dimension: usize, model: impl Into<String>) -> Self {
        Self {
            meta: SnapshotMeta {
                generation: 0,
                model: model.into(),
            },
            index: VectorIndex::new(dimension),
            store: DocumentStore::new(),
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.meta.generation
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.meta.model
    }

    #[inline]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[inline]
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty() || self.index.is_empty()
    }

    /// Add vectors and their chunks as one unit. Nothing is added on error.
    #[inline]
    pub fn stage(&mut self, vectors: Vec<Vec<f32>>, chunks: Vec<Chunk>) -> Result<Range<usize>> {
        if vectors.len() != chunks.len() {
            return Err(DocsError::Embedding(format!(
                "{} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let first_slot = self.index.add(vectors)?;
        let slots = self.store.append(chunks);
        debug_assert_eq!(first_slot, slots.start);
        Ok(slots)
    }

    fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let vectors_tmp = dir.join(format!("{VECTORS_FILE}.tmp"));
        let documents_tmp = dir.join(format!("{DOCUMENTS_FILE}.tmp"));

        self.index.save(&vectors_tmp, &self.meta)?;
        self.store.save(&documents_tmp, &self.meta)?;

        std::fs::rename(&documents_tmp, dir.join(DOCUMENTS_FILE))?;
        std::fs::rename(&vectors_tmp, dir.join(VECTORS_FILE))?;
        Ok(())
    }

    fn load(dir: &Path) -> Result<Option<Self>> {
        let vectors_path = dir.join(VECTORS_FILE);
        let documents_path = dir.join(DOCUMENTS_FILE);

        match (vectors_path.exists(), documents_path.exists()) {
            (false, false) => return Ok(None),
            (true, true) => {}
            _ => {
                return Err(DocsError::IndexUnavailable(format!(
                    "only one of {VECTORS_FILE} and {DOCUMENTS_FILE} exists in {}",
                    dir.display()
                )));
            }
        }

        let (index, vector_meta) = VectorIndex::load(&vectors_path)?;
        let (store, document_meta) = DocumentStore::load(&documents_path)?;

        if vector_meta != document_meta {
            return Err(DocsError::IndexUnavailable(format!(
                "artifact mismatch: vectors at generation {} ({}), documents at generation {} ({})",
                vector_meta.generation,
                vector_meta.model,
                document_meta.generation,
                document_meta.model
            )));
        }
        if index.len() != store.len() {
            return Err(DocsError::IndexUnavailable(format!(
                "{} vectors but {} chunks",
                index.len(),
                store.len()
            )));
        }

        Ok(Some(Self {
            meta: vector_meta,
            index,
            store,
        }))
    }
}

/// Proof that the caller holds the single ingestion slot
pub struct WriterGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// Owner of the process-wide index snapshot
///
/// Readers grab an `Arc` to the current snapshot and keep it for the whole
/// query. Writers are serialized, build a new snapshot off to the side, persist
/// it and only then swap it in.
pub struct IndexService {
    dir: PathBuf,
    dimension: usize,
    model: String,
    state: RwLock<Option<Arc<IndexSnapshot>>>,
    writer: Mutex<()>,
}

impl IndexService {
    #[inline]
    pub fn new(dir: impl Into<PathBuf>, dimension: usize, model: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            dimension,
            model: model.into(),
            state: RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    #[inline]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.index_dir(),
            config.ollama.embedding_dimension as usize,
            config.ollama.model.clone(),
        )
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fail with `ModelMismatch` unless `embedder` produces this index's vectors
    #[inline]
    pub fn check_embedder(&self, embedder: &dyn Embedder) -> Result<()> {
        if embedder.model_id() == self.model {
            return Ok(());
        }
        Err(DocsError::ModelMismatch {
            indexed: self.model.clone(),
            configured: embedder.model_id().to_string(),
        })
    }

    /// Empty snapshot for this index's dimension and model
    #[inline]
    pub fn empty_snapshot(&self) -> IndexSnapshot {
        IndexSnapshot::empty(self.dimension, self.model.clone())
    }

    /// Current snapshot, loading it from disk on first use
    ///
    /// A missing index yields an empty snapshot. Unreadable artifacts yield
    /// `IndexUnavailable` and are retried on the next call.
    #[inline]
    pub async fn snapshot(&self) -> Result<Arc<IndexSnapshot>> {
        let current = self.state.read().await.clone();
        if let Some(snapshot) = current {
            return Ok(snapshot);
        }

        let mut state = self.state.write().await;
        if let Some(snapshot) = state.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let snapshot = Arc::new(self.load_from_disk().await?);
        *state = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Take the ingestion slot. Held for the whole build-persist-swap cycle.
    #[inline]
    pub async fn lock_writer(&self) -> WriterGuard<'_> {
        WriterGuard {
            _guard: self.writer.lock().await,
        }
    }

    /// Persist `snapshot` as the next generation and make it current
    #[inline]
    pub async fn commit(
        &self,
        _writer: &WriterGuard<'_>,
        mut snapshot: IndexSnapshot,
    ) -> Result<Arc<IndexSnapshot>> {
        let previous = self
            .state
            .read()
            .await
            .as_ref()
            .map_or(0, |current| current.generation());
        snapshot.meta = SnapshotMeta {
            generation: previous.max(snapshot.meta.generation) + 1,
            model: self.model.clone(),
        };

        let snapshot = Arc::new(snapshot);
        let dir = self.dir.clone();
        let to_save = Arc::clone(&snapshot);
        tokio::task::spawn_blocking(move || to_save.save(&dir))
            .await
            .map_err(|e| DocsError::Other(anyhow::anyhow!("Persist task failed: {e}")))??;

        *self.state.write().await = Some(Arc::clone(&snapshot));

        info!(
            "Committed index generation {} with {} chunks",
            snapshot.generation(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    async fn load_from_disk(&self) -> Result<IndexSnapshot> {
        let dir = self.dir.clone();
        let loaded = tokio::task::spawn_blocking(move || IndexSnapshot::load(&dir))
            .await
            .map_err(|e| DocsError::Other(anyhow::anyhow!("Load task failed: {e}")))?;

        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(e @ DocsError::IndexUnavailable(_)) => {
                warn!("Persisted index in {} is unusable: {}", self.dir.display(), e);
                return Err(e);
            }
            Err(e) => {
                warn!("Failed to read index from {}: {}", self.dir.display(), e);
                return Err(DocsError::IndexUnavailable(e.to_string()));
            }
        };

        let Some(snapshot) = loaded else {
            debug!("No index found in {}, starting empty", self.dir.display());
            return Ok(self.empty_snapshot());
        };

        if snapshot.model() != self.model {
            return Err(DocsError::ModelMismatch {
                indexed: snapshot.model().to_string(),
                configured: self.model.clone(),
            });
        }
        if snapshot.index.dimension() != self.dimension {
            return Err(DocsError::DimensionMismatch {
                expected: self.dimension,
                actual: snapshot.index.dimension(),
            });
        }

        info!(
            "Loaded index generation {} with {} chunks from {}",
            snapshot.generation(),
            snapshot.len(),
            self.dir.display()
        );
        Ok(snapshot)
    }
}
