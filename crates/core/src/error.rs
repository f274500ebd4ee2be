use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("pdf is encrypted and cannot be read")]
    Encrypted,

    #[error("pdf has no pages")]
    NoPages,

    #[error("pdf had no readable page text")]
    NoReadableText,

    #[error("unsupported media type: {0} (expected application/pdf)")]
    UnsupportedMediaType(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),
}

/// Raised when a question arrives before any document has been loaded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("no document has been uploaded yet; upload a PDF before asking questions")]
    NoDocument,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid endpoint {endpoint}: {details}")]
    InvalidEndpoint { endpoint: String, details: String },

    #[error("invalid value for {name}: {details}")]
    Invalid { name: &'static str, details: String },
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion service rejected the credentials ({status})")]
    Auth { status: u16 },

    #[error("completion service rate limit reached{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("completion request timed out after {0}s")]
    Timeout(u64),

    #[error("completion service error: {0}")]
    Upstream(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!("; retry after {secs}s"),
        None => String::new(),
    }
}

/// Failure of one user action (an upload or a question).
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl ChatError {
    /// Short machine-readable tag, used by the HTTP surface and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Ingest(_) => "ingest",
            ChatError::Assembly(_) => "assembly",
            ChatError::Completion(CompletionError::Auth { .. }) => "auth",
            ChatError::Completion(CompletionError::RateLimited { .. }) => "rate_limit",
            ChatError::Completion(CompletionError::Timeout(_)) => "timeout",
            ChatError::Completion(CompletionError::Upstream(_)) => "upstream",
        }
    }
}
