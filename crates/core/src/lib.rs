pub mod assistant;
pub mod chunking;
pub mod completion;
pub mod config;
pub mod document;
pub mod error;
pub mod ingest;
pub mod models;
pub mod prompt;
pub mod render;
pub mod session;

#[cfg(test)]
mod test_support;

pub use assistant::{record_answer, store_document, Assistant, UploadOutcome};
pub use chunking::{join_pages, split_into_chunks, ChunkingConfig};
pub use completion::{AzureOpenAiClient, CompletionService};
pub use config::{CompletionConfig, GenerationParams};
pub use document::{extract_uploaded, LopdfExtractor, PageText, PdfExtractor};
pub use error::{AssemblyError, ChatError, CompletionError, ConfigError, IngestError};
pub use ingest::{ingest_document, IngestedDocument};
pub use models::{
    ConversationTurn, DocumentSummary, IngestionOptions, Role, SessionContext, TextChunk,
    UploadedDocument, PDF_MEDIA_TYPE,
};
pub use prompt::{PromptTemplate, DEFAULT_ASSISTANT_NAME};
pub use render::{render_transcript, render_turn};
pub use session::{Session, SessionId, SessionRegistry};
