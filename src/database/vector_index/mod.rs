#[cfg(test)]
mod tests;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FORMAT_VERSION, SnapshotMeta};
use crate::{DocsError, Result};

/// Flat exact-search index over squared L2 distance
///
/// Slots are dense, zero-based and assigned in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct VectorFileRef<'a> {
    format_version: u32,
    #[serde(flatten)]
    meta: &'a SnapshotMeta,
    dimension: usize,
    vectors: &'a [Vec<f32>],
}

#[derive(Deserialize)]
struct VectorFile {
    format_version: u32,
    #[serde(flatten)]
    meta: SnapshotMeta,
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    #[inline]
    pub fn vector(&self, slot: usize) -> Option<&[f32]> {
        self.vectors.get(slot).map(Vec::as_slice)
    }

    /// Append vectors at the next free slots, returning the first assigned slot.
    ///
    /// Every vector is checked before any is stored, so a rejected batch leaves
    /// the index untouched.
    #[inline]
    pub fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<usize> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(DocsError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        let first_slot = self.vectors.len();
        self.vectors.extend(vectors);
        Ok(first_slot)
    }

    /// Return up to `k` `(slot, squared_distance)` pairs, nearest first.
    /// Equal distances are ordered by slot.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(DocsError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(slot, vector)| (slot, squared_l2(query, vector)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        debug!(
            "Vector search over {} slots returned {} hits",
            self.vectors.len(),
            scored.len()
        );
        Ok(scored)
    }

    pub(crate) fn save(&self, path: &Path, meta: &SnapshotMeta) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(
            &mut writer,
            &VectorFileRef {
                format_version: FORMAT_VERSION,
                meta,
                dimension: self.dimension,
                vectors: &self.vectors,
            },
        )?;
        writer.flush()?;
        Ok(())
    }

    pub(crate) fn load(path: &Path) -> Result<(Self, SnapshotMeta)> {
        let file = File::open(path)?;
        let parsed: VectorFile = serde_json::from_reader(BufReader::new(file))?;

        if parsed.format_version != FORMAT_VERSION {
            return Err(DocsError::IndexUnavailable(format!(
                "unsupported vector file version {}",
                parsed.format_version
            )));
        }

        let mut index = Self::new(parsed.dimension);
        index.add(parsed.vectors)?;
        Ok((index, parsed.meta))
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
