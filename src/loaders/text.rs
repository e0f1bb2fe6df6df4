use std::path::Path;

use pulldown_cmark::{Event, Parser, TagEnd};

use super::{DocumentLoader, decode_text, read_bytes};
use crate::Result;

pub struct PlainTextLoader;

impl DocumentLoader for PlainTextLoader {
    fn extensions(&self) -> &'static [&'static str] {
        &["txt"]
    }

    fn load(&self, path: &Path) -> Result<String> {
        Ok(decode_text(read_bytes(path)?))
    }
}

/// Keeps the readable text of a Markdown file, dropping markup
pub struct MarkdownLoader;

impl DocumentLoader for MarkdownLoader {
    fn extensions(&self) -> &'static [&'static str] {
        &["md", "markdown"]
    }

    fn load(&self, path: &Path) -> Result<String> {
        let source = decode_text(read_bytes(path)?);
        Ok(markdown_to_text(&source))
    }
}

pub(crate) fn markdown_to_text(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());

    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote(_)
                | TagEnd::TableRow
                | TagEnd::TableHead,
            ) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Event::End(TagEnd::TableCell) => out.push(' '),
            _ => {}
        }
    }

    out.trim().to_string()
}
