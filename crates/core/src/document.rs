use crate::error::IngestError;
use crate::models::UploadedDocument;
use lopdf::Document;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

pub trait PdfExtractor {
    /// Returns one entry per page, in page order.
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
        let document = Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        if document.is_encrypted() {
            return Err(IngestError::Encrypted);
        }

        let page_numbers = document.get_pages().into_keys().collect::<Vec<_>>();
        if page_numbers.is_empty() {
            return Err(IngestError::NoPages);
        }

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page_no in page_numbers {
            let text = match document.extract_text(&[page_no]) {
                Ok(text) => text,
                Err(error) => {
                    warn!(page = page_no, %error, "page text could not be extracted");
                    String::new()
                }
            };
            pages.push(PageText {
                number: page_no,
                text,
            });
        }

        Ok(pages)
    }
}

/// Writes the upload to a scratch file, runs the extractor on it and removes
/// the file again whether or not extraction succeeded.
pub fn extract_uploaded(
    document: &UploadedDocument,
    extractor: &dyn PdfExtractor,
) -> Result<Vec<PageText>, IngestError> {
    if !document.is_pdf() {
        return Err(IngestError::UnsupportedMediaType(document.media_type.clone()));
    }

    let mut scratch = tempfile::Builder::new()
        .prefix("pdf-chat-")
        .suffix(".pdf")
        .tempfile()?;
    scratch.write_all(&document.bytes)?;
    scratch.flush()?;

    debug!(path = %scratch.path().display(), bytes = document.bytes.len(), "wrote upload to scratch file");

    extractor.extract_pages(scratch.path())
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
