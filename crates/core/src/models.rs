use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Raw upload as received from the user. Only lives for the duration of ingestion.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub file_name: Option<String>,
}

impl UploadedDocument {
    pub fn pdf(bytes: Vec<u8>, file_name: Option<String>) -> Self {
        Self {
            bytes,
            media_type: PDF_MEDIA_TYPE.to_string(),
            file_name,
        }
    }

    /// Builds an upload from what a client declared. A missing or generic
    /// media type falls back to the file extension.
    pub fn from_parts(bytes: Vec<u8>, declared_type: Option<&str>, file_name: Option<String>) -> Self {
        let declared = declared_type
            .map(str::trim)
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("application/octet-stream"));
        let has_pdf_extension = file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"));

        let media_type = match declared {
            Some(value) => value.to_string(),
            None if has_pdf_extension => PDF_MEDIA_TYPE.to_string(),
            None => "application/octet-stream".to_string(),
        };

        Self {
            bytes,
            media_type,
            file_name,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type
            .split(';')
            .next()
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub index: usize,
    /// Character (not byte) offset of the first character in the source text.
    pub char_start: usize,
    pub char_end: usize,
    pub text: String,
}

/// The document text handed to the model with every question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext(String);

impl SessionContext {
    pub fn from_chunks(chunks: &[TextChunk]) -> Self {
        let joined = chunks
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl From<String> for SessionContext {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// What an accepted upload produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub file_name: Option<String>,
    pub checksum: String,
    pub page_count: usize,
    pub chunk_count: usize,
    pub context_chars: usize,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub chunk_max_chars: usize,
    pub chunk_overlap_chars: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            chunk_max_chars: 2_000,
            chunk_overlap_chars: 200,
        }
    }
}
