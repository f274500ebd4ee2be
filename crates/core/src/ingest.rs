use crate::chunking::{join_pages, split_into_chunks, ChunkingConfig};
use crate::document::{digest_bytes, extract_uploaded, PdfExtractor};
use crate::error::IngestError;
use crate::models::{DocumentSummary, IngestionOptions, SessionContext, UploadedDocument};
use chrono::Utc;
use tracing::info;

/// A fully prepared document: nothing is stored until ingestion has produced all of it.
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub context: SessionContext,
    pub summary: DocumentSummary,
}

pub fn ingest_document(
    document: &UploadedDocument,
    extractor: &dyn PdfExtractor,
    options: &IngestionOptions,
) -> Result<IngestedDocument, IngestError> {
    let config = ChunkingConfig::from(options.clone());
    config.validate()?;

    let checksum = digest_bytes(&document.bytes);
    let pages = extract_uploaded(document, extractor)?;
    let full_text = join_pages(&pages);

    if full_text.is_empty() {
        return Err(IngestError::NoReadableText);
    }

    let chunks = split_into_chunks(&full_text, config)?;
    let context = SessionContext::from_chunks(&chunks);

    let summary = DocumentSummary {
        file_name: document.file_name.clone(),
        checksum,
        page_count: pages.len(),
        chunk_count: chunks.len(),
        context_chars: context.char_len(),
        ingested_at: Utc::now(),
    };

    info!(
        file = summary.file_name.as_deref().unwrap_or("<unnamed>"),
        checksum = %summary.checksum,
        pages = summary.page_count,
        chunks = summary.chunk_count,
        context_chars = summary.context_chars,
        "document ingested"
    );

    Ok(IngestedDocument { context, summary })
}
