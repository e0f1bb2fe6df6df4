// Indexer module
// Loads files, chunks and embeds them, and commits the result as one new
// index generation


use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::database::{Chunk, IndexService, IndexSnapshot};
use crate::embeddings::{ChunkingConfig, Embedder};
use crate::loaders::LoaderRegistry;
use crate::{DocsError, Result};

/// A file that contributed nothing because something went wrong with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionReport {
    pub files_indexed: usize,
    pub chunks_added: usize,
    /// Unsupported, empty or already-indexed files
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    /// Whether a new generation was written
    pub committed: bool,
    pub generation: Option<u64>,
}

enum FileOutcome {
    Staged(usize),
    Skipped(&'static str),
}

/// Drives loaders, chunker and embedder to populate the index
pub struct Indexer {
    index: Arc<IndexService>,
    embedder: Arc<dyn Embedder>,
    loaders: LoaderRegistry,
    chunking: ChunkingConfig,
    show_progress: bool,
}

impl Indexer {
    #[inline]
    pub fn new(index: Arc<IndexService>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index,
            embedder,
            loaders: LoaderRegistry::with_defaults(),
            chunking: ChunkingConfig::default(),
            show_progress: false,
        }
    }

    #[inline]
    pub fn from_config(
        config: &Config,
        index: Arc<IndexService>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self::new(index, embedder).with_chunking(config.chunking.clone())
    }

    #[inline]
    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    #[inline]
    pub fn with_loaders(mut self, loaders: LoaderRegistry) -> Self {
        self.loaders = loaders;
        self
    }

    #[inline]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Ingest every supported file under `paths`
    ///
    /// Per-file problems are reported, not returned. An embedding dimension
    /// mismatch aborts the run before anything is written. An unreadable index
    /// on disk is replaced by whatever this run stages.
    #[inline]
    pub async fn ingest(&self, paths: &[PathBuf]) -> Result<IngestionReport> {
        let mut report = IngestionReport::default();
        let files = self.collect_files(paths, &mut report);

        info!(
            "Ingesting {} files ({} skipped during discovery)",
            files.len(),
            report.skipped.len()
        );

        self.index.check_embedder(self.embedder.as_ref())?;

        let writer = self.index.lock_writer().await;
        let mut staged: IndexSnapshot = match self.index.snapshot().await {
            Ok(base) => (*base).clone(),
            Err(DocsError::IndexUnavailable(reason)) => {
                warn!("Rebuilding unreadable index from scratch: {}", reason);
                self.index.empty_snapshot()
            }
            Err(e) => return Err(e),
        };

        let bar = self.progress_bar(files.len());

        for path in &files {
            bar.set_message(display_name(path));

            match self.ingest_file(path, &mut staged).await {
                Ok(FileOutcome::Staged(count)) => {
                    report.files_indexed += 1;
                    report.chunks_added += count;
                }
                Ok(FileOutcome::Skipped(reason)) => {
                    debug!("Skipping {}: {}", path.display(), reason);
                    report.skipped.push(path.clone());
                }
                Err(e @ DocsError::DimensionMismatch { .. }) => {
                    bar.abandon_with_message("aborted");
                    error!("Aborting ingestion at {}: {}", path.display(), e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Failed to ingest {}: {}", path.display(), e);
                    report.failures.push(FileFailure {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            bar.inc(1);
        }
        bar.finish_and_clear();

        if report.chunks_added == 0 {
            info!("No new chunks, index left unchanged");
            return Ok(report);
        }

        let committed = self.index.commit(&writer, staged).await?;
        report.committed = true;
        report.generation = Some(committed.generation());

        info!(
            "Indexed {} files, {} chunks (generation {})",
            report.files_indexed,
            report.chunks_added,
            committed.generation()
        );
        Ok(report)
    }

    async fn ingest_file(&self, path: &Path, staged: &mut IndexSnapshot) -> Result<FileOutcome> {
        let loaders = self.loaders.clone();
        let owned_path = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || loaders.load(&owned_path))
            .await
            .map_err(|e| DocsError::Other(anyhow::anyhow!("Loader task failed: {e}")))??;

        let pieces = self.chunking.chunk(&text);
        if pieces.is_empty() {
            return Ok(FileOutcome::Skipped("no text"));
        }

        let source_file = display_name(path);
        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Chunk {
                id: format!("{source_file}_{ordinal}"),
                text,
                source_file: source_file.clone(),
            })
            .collect();

        if chunks.iter().any(|c| staged.store().contains_id(&c.id)) {
            return Ok(FileOutcome::Skipped("already indexed"));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_many(&texts).await?;

        let slots = staged.stage(vectors, chunks)?;
        debug!(
            "Staged {} chunks from {} at slots {:?}",
            slots.len(),
            path.display(),
            slots
        );
        Ok(FileOutcome::Staged(slots.len()))
    }

    /// Expand directories and sort out unsupported or missing paths
    fn collect_files(&self, paths: &[PathBuf], report: &mut IngestionReport) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in paths {
            if path.is_dir() {
                for entry in WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|entry| match entry {
                        Ok(entry) => Some(entry),
                        Err(e) => {
                            warn!("Cannot read directory entry: {}", e);
                            None
                        }
                    })
                {
                    if entry.file_type().is_dir() {
                        continue;
                    }
                    self.sort_file(entry.into_path(), &mut files, report);
                }
            } else if path.exists() {
                self.sort_file(path.clone(), &mut files, report);
            } else {
                report.failures.push(FileFailure {
                    path: path.clone(),
                    reason: "path does not exist".to_string(),
                });
            }
        }

        files
    }

    fn sort_file(&self, path: PathBuf, files: &mut Vec<PathBuf>, report: &mut IngestionReport) {
        if self.loaders.supports(&path) {
            files.push(path);
        } else {
            debug!("Unsupported file type: {}", path.display());
            report.skipped.push(path);
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        ProgressBar::new(len as u64).with_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] Indexing {msg}")
                .expect("style template is valid"),
        )
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
