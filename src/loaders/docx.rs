use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use super::{DocumentLoader, loader_error};
use crate::Result;

const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraph text of a Word document, one paragraph per line
pub struct DocxLoader;

impl DocumentLoader for DocxLoader {
    fn extensions(&self) -> &'static [&'static str] {
        &["docx"]
    }

    fn load(&self, path: &Path) -> Result<String> {
        let file = File::open(path).map_err(|e| loader_error(path, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| loader_error(path, e))?;

        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| loader_error(path, format!("{DOCUMENT_PART}: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| loader_error(path, e))?;

        document_xml_to_text(&xml).map_err(|e| loader_error(path, e))
    }
}

/// Text of every `w:p` paragraph in a WordprocessingML body, joined by newlines
pub(crate) fn document_xml_to_text(xml: &str) -> std::result::Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" if in_paragraph => current.push('\t'),
                b"br" | b"cr" if in_paragraph => current.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_text => current.push_str(&e.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut current));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}
