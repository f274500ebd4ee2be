use crate::completion::CompletionService;
use crate::document::{LopdfExtractor, PdfExtractor};
use crate::error::{AssemblyError, ChatError, CompletionError, IngestError};
use crate::ingest::{ingest_document, IngestedDocument};
use crate::models::{ConversationTurn, DocumentSummary, IngestionOptions, UploadedDocument};
use crate::prompt::PromptTemplate;
use crate::session::Session;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub enum UploadOutcome {
    Loaded(DocumentSummary),
    /// A document was already loaded in this session; the upload was not read.
    Ignored,
}

/// Runs uploads and questions against a [`Session`].
pub struct Assistant<C, E = LopdfExtractor>
where
    C: CompletionService,
    E: PdfExtractor,
{
    completion: C,
    extractor: E,
    template: PromptTemplate,
    options: IngestionOptions,
}

impl<C> Assistant<C, LopdfExtractor>
where
    C: CompletionService,
{
    pub fn new(completion: C, template: PromptTemplate) -> Self {
        Self::with_extractor(completion, LopdfExtractor, template, IngestionOptions::default())
    }
}

impl<C, E> Assistant<C, E>
where
    C: CompletionService,
    E: PdfExtractor,
{
    pub fn with_extractor(
        completion: C,
        extractor: E,
        template: PromptTemplate,
        options: IngestionOptions,
    ) -> Self {
        Self {
            completion,
            extractor,
            template,
            options,
        }
    }

    pub fn assistant_name(&self) -> &str {
        &self.template.assistant_name
    }

    /// Extracts and chunks a document without touching any session.
    pub fn ingest(&self, document: &UploadedDocument) -> Result<IngestedDocument, IngestError> {
        ingest_document(document, &self.extractor, &self.options)
    }

    pub fn upload(
        &self,
        session: &mut Session,
        document: &UploadedDocument,
    ) -> Result<UploadOutcome, ChatError> {
        if session.has_context() {
            info!(session = %session.id(), "document already loaded; ignoring upload");
            return Ok(UploadOutcome::Ignored);
        }

        let ingested = self.ingest(document).map_err(|error| {
            warn!(session = %session.id(), %error, "upload rejected");
            error
        })?;
        Ok(store_document(session, ingested))
    }

    /// Records the question and renders the prompt for it.
    pub fn submit_question(
        &self,
        session: &mut Session,
        question: &str,
    ) -> Result<String, AssemblyError> {
        session.append_turn(ConversationTurn::user(question));
        let prompt = self.template.build_prompt(session.context(), question)?;
        debug!(session = %session.id(), prompt_chars = prompt.chars().count(), "prompt assembled");
        Ok(prompt)
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.completion.complete(prompt).await
    }

    /// Submits, completes and records one question. On failure the user turn
    /// stays in the history and no assistant turn is added.
    pub async fn ask(&self, session: &mut Session, question: &str) -> Result<String, ChatError> {
        let prompt = self.submit_question(session, question).map_err(|error| {
            warn!(session = %session.id(), %error, "question submitted without a document");
            error
        })?;

        match self.complete(&prompt).await {
            Ok(answer) => {
                record_answer(session, &answer);
                Ok(answer)
            }
            Err(error) => {
                warn!(
                    session = %session.id(),
                    provider = self.completion.name(),
                    %error,
                    "completion failed"
                );
                Err(error.into())
            }
        }
    }
}

/// Stores a finished ingestion as the session context, unless one is already set.
pub fn store_document(session: &mut Session, ingested: IngestedDocument) -> UploadOutcome {
    let IngestedDocument { context, summary } = ingested;
    if session.set_context_once(context) {
        info!(session = %session.id(), chunks = summary.chunk_count, "document loaded");
        UploadOutcome::Loaded(summary)
    } else {
        UploadOutcome::Ignored
    }
}

pub fn record_answer(session: &mut Session, answer: &str) {
    session.append_turn(ConversationTurn::assistant(answer));
}
