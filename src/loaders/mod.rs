// Document loaders
// Turn a file on disk into plain text, selected by file extension

mod csv;
mod docx;
mod html;
mod pdf;
mod text;


use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

pub use csv::CsvLoader;
pub use docx::DocxLoader;
pub use html::HtmlLoader;
pub use pdf::PdfLoader;
pub use text::{MarkdownLoader, PlainTextLoader};

use crate::{DocsError, Result};

/// Converts one file format to plain text
pub trait DocumentLoader: Send + Sync {
    /// Lowercase extensions this loader handles, without the dot
    fn extensions(&self) -> &'static [&'static str];

    fn load(&self, path: &Path) -> Result<String>;
}

/// Extension-keyed set of loaders
#[derive(Clone, Default)]
pub struct LoaderRegistry {
    loaders: BTreeMap<String, Arc<dyn DocumentLoader>>,
}

impl LoaderRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in format
    #[inline]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PlainTextLoader));
        registry.register(Arc::new(MarkdownLoader));
        registry.register(Arc::new(CsvLoader));
        registry.register(Arc::new(DocxLoader));
        registry.register(Arc::new(HtmlLoader));
        registry.register(Arc::new(PdfLoader));
        registry
    }

    /// Register a loader for all of its extensions, replacing earlier ones
    #[inline]
    pub fn register(&mut self, loader: Arc<dyn DocumentLoader>) {
        for ext in loader.extensions() {
            self.loaders.insert(ext.to_lowercase(), Arc::clone(&loader));
        }
    }

    #[inline]
    pub fn supports(&self, path: &Path) -> bool {
        self.loader_for(path).is_some()
    }

    #[inline]
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    #[inline]
    pub fn loader_for(&self, path: &Path) -> Option<&dyn DocumentLoader> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.loaders.get(&ext).map(AsRef::as_ref)
    }

    #[inline]
    pub fn load(&self, path: &Path) -> Result<String> {
        let loader = self.loader_for(path).ok_or_else(|| DocsError::Loader {
            path: path.to_path_buf(),
            reason: "unsupported file type".to_string(),
        })?;

        let text = loader.load(path)?;
        debug!("Loaded {} chars from {}", text.chars().count(), path.display());
        Ok(text)
    }
}

pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| loader_error(path, e))
}

/// Decode as UTF-8, falling back to Latin-1 for legacy files
pub(crate) fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}

pub(crate) fn loader_error(path: &Path, reason: impl ToString) -> DocsError {
    DocsError::Loader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
