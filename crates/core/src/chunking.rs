use crate::document::PageText;
use crate::error::IngestError;
use crate::models::{IngestionOptions, TextChunk};

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl From<IngestionOptions> for ChunkingConfig {
    fn from(value: IngestionOptions) -> Self {
        Self {
            max_chars: value.chunk_max_chars,
            overlap_chars: value.chunk_overlap_chars,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::from(IngestionOptions::default())
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.max_chars == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "max_chars must be greater than zero".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap_chars ({}) must be smaller than max_chars ({})",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

pub fn normalize_page_text(text: &str) -> String {
    text.replace('\u{a0}', " ").trim().to_string()
}

/// Concatenates page texts in page order, separated by a blank line. Blank pages are dropped.
pub fn join_pages(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|page| normalize_page_text(&page.text))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Byte length and character count of the first `max_chars` characters of `text`.
fn char_prefix(text: &str, max_chars: usize) -> (usize, usize) {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => (offset, max_chars),
        None => (text.len(), text.chars().count()),
    }
}

/// Splits `text` into windows of at most `max_chars` characters, each starting
/// `max_chars - overlap_chars` characters after the previous one.
pub fn split_into_chunks(text: &str, config: ChunkingConfig) -> Result<Vec<TextChunk>, IngestError> {
    config.validate()?;

    let step = config.max_chars - config.overlap_chars;
    let mut chunks = Vec::new();
    let mut start_byte = 0;
    let mut start_char = 0;

    while start_byte < text.len() {
        let rest = &text[start_byte..];
        let (window_bytes, window_chars) = char_prefix(rest, config.max_chars);
        chunks.push(TextChunk {
            index: chunks.len(),
            char_start: start_char,
            char_end: start_char + window_chars,
            text: rest[..window_bytes].to_string(),
        });
        if start_byte + window_bytes == text.len() {
            break;
        }
        // The window stopped short of the end, so `rest` holds more than `step` characters.
        let (step_bytes, _) = char_prefix(rest, step);
        start_byte += step_bytes;
        start_char += step;
    }

    Ok(chunks)
}
