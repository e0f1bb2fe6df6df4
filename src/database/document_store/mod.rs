
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{FORMAT_VERSION, SnapshotMeta};
use crate::{DocsError, Result};

/// A slice of a source document as stored alongside its embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source_file: String,
}

/// Append-only chunk list addressed by vector slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStore {
    chunks: Vec<Chunk>,
    ids: HashSet<String>,
}

#[derive(Serialize)]
struct DocumentFileRef<'a> {
    format_version: u32,
    #[serde(flatten)]
    meta: &'a SnapshotMeta,
    chunks: &'a [Chunk],
}

#[derive(Deserialize)]
struct DocumentFile {
    format_version: u32,
    #[serde(flatten)]
    meta: SnapshotMeta,
    chunks: Vec<Chunk>,
}

impl DocumentStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Append chunks and return the slots they were given
    #[inline]
    pub fn append(&mut self, chunks: Vec<Chunk>) -> Range<usize> {
        let start = self.chunks.len();
        self.ids.extend(chunks.iter().map(|c| c.id.clone()));
        self.chunks.extend(chunks);
        start..self.chunks.len()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Result<&Chunk> {
        self.chunks.get(slot).ok_or(DocsError::NotFound(slot))
    }

    #[inline]
    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub(crate) fn save(&self, path: &Path, meta: &SnapshotMeta) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(
            &mut writer,
            &DocumentFileRef {
                format_version: FORMAT_VERSION,
                meta,
                chunks: &self.chunks,
            },
        )?;
        writer.flush()?;
        Ok(())
    }

    pub(crate) fn load(path: &Path) -> Result<(Self, SnapshotMeta)> {
        let file = File::open(path)?;
        let parsed: DocumentFile = serde_json::from_reader(BufReader::new(file))?;

        if parsed.format_version != FORMAT_VERSION {
            return Err(DocsError::IndexUnavailable(format!(
                "unsupported document file version {}",
                parsed.format_version
            )));
        }

        let mut store = Self::new();
        store.append(parsed.chunks);
        Ok((store, parsed.meta))
    }
}
