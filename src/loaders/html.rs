use std::path::Path;

use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};

use super::{DocumentLoader, decode_text, read_bytes};
use crate::Result;

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Visible body text of an HTML page, one text run per line
pub struct HtmlLoader;

impl DocumentLoader for HtmlLoader {
    fn extensions(&self) -> &'static [&'static str] {
        &["html", "htm"]
    }

    fn load(&self, path: &Path) -> Result<String> {
        let source = decode_text(read_bytes(path)?);
        Ok(html_to_text(&source))
    }
}

pub(crate) fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("valid selector");
    let root = document
        .select(&body_selector)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut lines: Vec<String> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| SKIPPED_ELEMENTS.contains(&el.value().name()));
        if hidden {
            continue;
        }

        let line = text.split_whitespace().join(" ");
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines.join("\n")
}
