use std::path::Path;

use csv::{ReaderBuilder, Trim};
use itertools::Itertools;
use tracing::{debug, warn};

use super::{DocumentLoader, decode_text, read_bytes};
use crate::Result;

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Renders each data row as `value | value | ...`; the header row is dropped
pub struct CsvLoader;

impl DocumentLoader for CsvLoader {
    fn extensions(&self) -> &'static [&'static str] {
        &["csv"]
    }

    fn load(&self, path: &Path) -> Result<String> {
        let source = decode_text(read_bytes(path)?);
        Ok(csv_to_text(&source))
    }
}

pub(crate) fn csv_to_text(source: &str) -> String {
    let Some(header) = source.lines().find(|line| !line.trim().is_empty()) else {
        return String::new();
    };

    let delimiter = sniff_delimiter(header);
    debug!("Using CSV delimiter {:?}", char::from(delimiter));

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source.as_bytes());

    reader
        .records()
        .filter_map(|record| match record {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed CSV record: {}", e);
                None
            }
        })
        .filter(|record| record.iter().any(|field| !field.is_empty()))
        .map(|record| record.iter().join(" | "))
        .join("\n")
}

/// Pick the candidate that splits the header into the most fields.
/// Earlier candidates win ties, and `,` is used when none occur.
pub(crate) fn sniff_delimiter(header: &str) -> u8 {
    CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .map(|d| (d, field_count(header, d)))
        .fold((b',', 1), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        })
        .0
}

fn field_count(line: &str, delimiter: u8) -> usize {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(std::result::Result::ok)
        .map_or(0, |record| record.len())
}
