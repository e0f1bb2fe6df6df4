use std::path::Path;

use lopdf::Document;
use tracing::warn;

use super::{DocumentLoader, loader_error};
use crate::Result;

/// Text layer of every page, in page order
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn extensions(&self) -> &'static [&'static str] {
        &["pdf"]
    }

    fn load(&self, path: &Path) -> Result<String> {
        let doc = Document::load(path).map_err(|e| loader_error(path, e))?;

        let mut page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        page_numbers.sort_unstable();

        let mut text = String::new();
        for page in page_numbers {
            match doc.extract_text(&[page]) {
                Ok(page_text) => {
                    text.push_str(page_text.trim_end());
                    text.push('\n');
                }
                Err(e) => warn!("Skipping page {} of {}: {}", page, path.display(), e),
            }
        }

        Ok(text)
    }
}
