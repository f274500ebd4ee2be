//! HTTP front end: one [`Session`](pdf_chat_core::Session) per client-held session id.

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use pdf_chat_core::{
    record_answer, store_document, Assistant, ChatError, CompletionError, CompletionService,
    ConversationTurn, DocumentSummary, LopdfExtractor, PdfExtractor, SessionId, SessionRegistry,
    UploadOutcome, UploadedDocument,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
}

pub struct AppState<C, E = LopdfExtractor>
where
    C: CompletionService + 'static,
    E: PdfExtractor + Send + Sync + 'static,
{
    assistant: Arc<Assistant<C, E>>,
    sessions: Arc<SessionRegistry>,
}

impl<C, E> AppState<C, E>
where
    C: CompletionService + 'static,
    E: PdfExtractor + Send + Sync + 'static,
{
    pub fn new(assistant: Assistant<C, E>) -> Self {
        Self {
            assistant: Arc::new(assistant),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}

impl<C, E> Clone for AppState<C, E>
where
    C: CompletionService + 'static,
    E: PdfExtractor + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            assistant: Arc::clone(&self.assistant),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

#[derive(Debug)]
enum ApiError {
    SessionNotFound(SessionId),
    Busy,
    BadRequest(String),
    Chat(ChatError),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

fn chat_status(error: &ChatError) -> StatusCode {
    match error {
        ChatError::Ingest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ChatError::Assembly(_) => StatusCode::CONFLICT,
        ChatError::Completion(CompletionError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
        ChatError::Completion(CompletionError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        ChatError::Completion(CompletionError::Auth { .. })
        | ChatError::Completion(CompletionError::Upstream(_)) => StatusCode::BAD_GATEWAY,
    }
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        let (status, kind) = match self {
            ApiError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Busy => (StatusCode::CONFLICT, "busy"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Chat(error) => (chat_status(error), error.kind()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        let error = match self {
            ApiError::SessionNotFound(id) => format!("session {id} not found"),
            ApiError::Busy => "another request for this session is still running".to_string(),
            ApiError::BadRequest(message) | ApiError::Internal(message) => message.clone(),
            ApiError::Chat(error) => error.to_string(),
        };
        (status, ErrorBody { error, kind })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(value: ChatError) -> Self {
        ApiError::Chat(value)
    }
}

/// Clears the session's in-flight flag when dropped, including when the
/// request future is cancelled.
struct ActionGuard {
    sessions: Arc<SessionRegistry>,
    id: SessionId,
}

impl ActionGuard {
    fn acquire(sessions: &Arc<SessionRegistry>, id: SessionId) -> Result<Self, ApiError> {
        let started = sessions
            .with_session(&id, |session| session.try_begin_action())
            .ok_or(ApiError::SessionNotFound(id))?;
        if !started {
            return Err(ApiError::Busy);
        }
        Ok(Self {
            sessions: Arc::clone(sessions),
            id,
        })
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.sessions
            .with_session(&self.id, |session| session.finish_action());
    }
}

#[derive(Serialize)]
struct CreatedSession {
    session_id: SessionId,
}

#[derive(Serialize)]
struct UploadResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<DocumentSummary>,
}

impl From<UploadOutcome> for UploadResponse {
    fn from(value: UploadOutcome) -> Self {
        match value {
            UploadOutcome::Loaded(summary) => Self {
                status: "loaded",
                document: Some(summary),
            },
            UploadOutcome::Ignored => Self {
                status: "ignored",
                document: None,
            },
        }
    }
}

#[derive(Deserialize)]
struct QuestionRequest {
    question: String,
}

#[derive(Serialize)]
struct AnswerResponse {
    answer: String,
    turns: usize,
}

#[derive(Serialize)]
struct HistoryResponse {
    turns: Vec<ConversationTurn>,
}

async fn create_session<C, E>(State(state): State<AppState<C, E>>) -> (StatusCode, Json<CreatedSession>)
where
    C: CompletionService + 'static,
    E: PdfExtractor + Send + Sync + 'static,
{
    let session_id = state.sessions.create();
    info!(session = %session_id, active = state.sessions.len(), "session created");
    (StatusCode::CREATED, Json(CreatedSession { session_id }))
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadedDocument, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| ApiError::BadRequest(format!("failed to read multipart field: {error}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let declared_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|error| ApiError::BadRequest(format!("failed to read file: {error}")))?;
        return Ok(UploadedDocument::from_parts(
            bytes.to_vec(),
            declared_type.as_deref(),
            file_name,
        ));
    }
    Err(ApiError::BadRequest(
        "multipart body has no `file` field".to_string(),
    ))
}

async fn upload_document<C, E>(
    State(state): State<AppState<C, E>>,
    Path(id): Path<SessionId>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError>
where
    C: CompletionService + 'static,
    E: PdfExtractor + Send + Sync + 'static,
{
    let loaded = state
        .sessions
        .with_session(&id, |session| session.has_context())
        .ok_or(ApiError::SessionNotFound(id))?;
    if loaded {
        return Ok(Json(UploadOutcome::Ignored.into()));
    }

    let document = read_upload(multipart).await?;
    let _guard = ActionGuard::acquire(&state.sessions, id)?;

    info!(
        session = %id,
        file = document.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = document.bytes.len(),
        "ingesting upload"
    );
    let assistant = Arc::clone(&state.assistant);
    let ingested = tokio::task::spawn_blocking(move || assistant.ingest(&document))
        .await
        .map_err(|error| ApiError::Internal(format!("ingestion task failed: {error}")))?
        .map_err(|error| {
            warn!(session = %id, %error, "upload rejected");
            ApiError::Chat(error.into())
        })?;

    let outcome = state
        .sessions
        .with_session(&id, |session| store_document(session, ingested))
        .ok_or(ApiError::SessionNotFound(id))?;
    Ok(Json(outcome.into()))
}

async fn ask_question<C, E>(
    State(state): State<AppState<C, E>>,
    Path(id): Path<SessionId>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<AnswerResponse>, ApiError>
where
    C: CompletionService + 'static,
    E: PdfExtractor + Send + Sync + 'static,
{
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    let _guard = ActionGuard::acquire(&state.sessions, id)?;

    let prompt = state
        .sessions
        .with_session(&id, |session| state.assistant.submit_question(session, &question))
        .ok_or(ApiError::SessionNotFound(id))?
        .map_err(ChatError::from)?;

    let answer = state.assistant.complete(&prompt).await.map_err(|error| {
        warn!(session = %id, %error, "completion failed");
        ChatError::from(error)
    })?;

    let turns = state
        .sessions
        .with_session(&id, |session| {
            record_answer(session, &answer);
            session.history().len()
        })
        .ok_or(ApiError::SessionNotFound(id))?;

    Ok(Json(AnswerResponse { answer, turns }))
}

async fn history<C, E>(
    State(state): State<AppState<C, E>>,
    Path(id): Path<SessionId>,
) -> Result<Json<HistoryResponse>, ApiError>
where
    C: CompletionService + 'static,
    E: PdfExtractor + Send + Sync + 'static,
{
    let turns = state
        .sessions
        .with_session(&id, |session| session.history().to_vec())
        .ok_or(ApiError::SessionNotFound(id))?;
    Ok(Json(HistoryResponse { turns }))
}

async fn reset_session<C, E>(
    State(state): State<AppState<C, E>>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError>
where
    C: CompletionService + 'static,
    E: PdfExtractor + Send + Sync + 'static,
{
    let reset = state
        .sessions
        .with_session(&id, |session| {
            if session.is_busy() {
                return false;
            }
            session.reset();
            true
        })
        .ok_or(ApiError::SessionNotFound(id))?;
    if !reset {
        return Err(ApiError::Busy);
    }
    info!(session = %id, "session reset");
    Ok(StatusCode::NO_CONTENT)
}

async fn end_session<C, E>(
    State(state): State<AppState<C, E>>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError>
where
    C: CompletionService + 'static,
    E: PdfExtractor + Send + Sync + 'static,
{
    let removed = state
        .sessions
        .remove_idle(&id)
        .ok_or(ApiError::SessionNotFound(id))?;
    if !removed {
        return Err(ApiError::Busy);
    }
    info!(session = %id, active = state.sessions.len(), "session ended");
    Ok(StatusCode::NO_CONTENT)
}

async fn health_check() -> &'static str {
    "OK"
}

fn build_router<C, E>(state: AppState<C, E>, max_upload_bytes: usize) -> Router
where
    C: CompletionService + 'static,
    E: PdfExtractor + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/sessions", post(create_session::<C, E>))
        .route("/api/sessions/:id", delete(end_session::<C, E>))
        .route(
            "/api/sessions/:id/document",
            post(upload_document::<C, E>).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/sessions/:id/questions", post(ask_question::<C, E>))
        .route("/api/sessions/:id/history", get(history::<C, E>))
        .route("/api/sessions/:id/reset", post(reset_session::<C, E>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve<C, E>(assistant: Assistant<C, E>, config: ServerConfig) -> anyhow::Result<()>
where
    C: CompletionService + 'static,
    E: PdfExtractor + Send + Sync + 'static,
{
    let router = build_router(AppState::new(assistant), config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(address = %config.bind, "pdf-chat server listening");

    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use pdf_chat_core::{
        AssemblyError, IngestError, IngestionOptions, PageText, PromptTemplate,
    };
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Clone, Default)]
    struct ScriptedCompletion {
        replies: Arc<Mutex<VecDeque<Result<String, CompletionError>>>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedCompletion {
        fn reply(&self, reply: Result<String, CompletionError>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::Upstream("no scripted reply".to_string())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct PlainTextExtractor;

    impl PdfExtractor for PlainTextExtractor {
        fn extract_pages(&self, path: &std::path::Path) -> Result<Vec<PageText>, IngestError> {
            Ok(vec![PageText {
                number: 1,
                text: std::fs::read_to_string(path)?,
            }])
        }
    }

    const BOUNDARY: &str = "pdf-chat-test-boundary";

    fn test_app() -> (Router, AppState<ScriptedCompletion, PlainTextExtractor>, ScriptedCompletion) {
        let completion = ScriptedCompletion::default();
        let assistant = Assistant::with_extractor(
            completion.clone(),
            PlainTextExtractor,
            PromptTemplate::new("Test Bot"),
            IngestionOptions::default(),
        );
        let state = AppState::new(assistant);
        (build_router(state.clone(), 1024 * 1024), state, completion)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn create(router: &Router) -> String {
        let request = Request::post("/api/sessions").body(Body::empty()).unwrap();
        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    async fn upload(
        router: &Router,
        id: &str,
        file_name: &str,
        content_type: &str,
        text: &str,
    ) -> (StatusCode, Value) {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             {text}\r\n\
             --{BOUNDARY}--\r\n"
        );
        let request = Request::post(format!("/api/sessions/{id}/document"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        send(router, request).await
    }

    async fn ask(router: &Router, id: &str, question: &str) -> (StatusCode, Value) {
        let request = Request::post(format!("/api/sessions/{id}/questions"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "question": question }).to_string()))
            .unwrap();
        send(router, request).await
    }

    async fn history_roles(router: &Router, id: &str) -> Vec<String> {
        let request = Request::get(format!("/api/sessions/{id}/history"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        body["turns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|turn| turn["role"].as_str().unwrap().to_string())
            .collect()
    }

    async fn call(router: &Router, method: &str, uri: String) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(router, request).await.0
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upload_then_ask_records_both_turns() {
        let (router, _, completion) = test_app();
        completion.reply(Ok("It is about pumps.".to_string()));
        let id = create(&router).await;

        let (status, body) = upload(&router, &id, "pumps.pdf", "application/pdf", "Pump maintenance notes.").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "loaded");
        assert_eq!(body["document"]["chunk_count"], 1);

        let (status, body) = upload(&router, &id, "other.pdf", "application/pdf", "Other text.").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ignored");

        let (status, body) = ask(&router, &id, "What is this about?").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "It is about pumps.");
        assert_eq!(body["turns"], 2);

        let prompts = completion.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Pump maintenance notes."));
        assert!(!prompts[0].contains("Other text."));
        assert_eq!(history_roles(&router, &id).await, vec!["user", "assistant"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn question_without_document_keeps_only_the_user_turn() {
        let (router, _, completion) = test_app();
        let id = create(&router).await;

        let (status, body) = ask(&router, &id, "What is this about?").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "assembly");
        assert!(completion.prompts().is_empty());
        assert_eq!(history_roles(&router, &id).await, vec!["user"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_completion_adds_no_answer_and_later_questions_work() {
        let (router, state, completion) = test_app();
        completion.reply(Err(CompletionError::Timeout(60)));
        completion.reply(Ok("Second try.".to_string()));
        let id = create(&router).await;
        upload(&router, &id, "notes.pdf", "application/pdf", "Quarterly figures.").await;

        let (status, body) = ask(&router, &id, "First?").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["kind"], "timeout");
        assert_eq!(history_roles(&router, &id).await, vec!["user"]);

        let session_id: SessionId = id.parse().unwrap();
        let context = state
            .sessions
            .with_session(&session_id, |session| session.context().map(|c| c.as_str().to_string()))
            .flatten();
        assert_eq!(context.as_deref(), Some("Quarterly figures."));

        let (status, body) = ask(&router, &id, "Second?").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["turns"], 3);
        assert_eq!(
            history_roles(&router, &id).await,
            vec!["user", "user", "assistant"]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sessions_do_not_share_documents_or_history() {
        let (router, _, completion) = test_app();
        completion.reply(Ok("Answer for A.".to_string()));
        let first = create(&router).await;
        let second = create(&router).await;

        upload(&router, &first, "a.pdf", "application/pdf", "Document A.").await;

        let (status, _) = ask(&router, &second, "Anything?").await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = ask(&router, &first, "Anything?").await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(history_roles(&router, &first).await, vec!["user", "assistant"]);
        assert_eq!(history_roles(&router, &second).await, vec!["user"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_upload_leaves_no_document() {
        let (router, _, _) = test_app();
        let id = create(&router).await;

        let (status, body) = upload(&router, &id, "notes.txt", "text/plain", "plain text").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "ingest");

        let (status, body) = ask(&router, &id, "Anything?").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "assembly");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reset_and_delete_wait_for_running_actions() {
        let (router, state, _) = test_app();
        let id = create(&router).await;
        let session_id: SessionId = id.parse().unwrap();

        let guard = ActionGuard::acquire(&state.sessions, session_id).unwrap();
        let (status, body) = ask(&router, &id, "Anything?").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "busy");
        assert_eq!(call(&router, "POST", format!("/api/sessions/{id}/reset")).await, StatusCode::CONFLICT);
        assert_eq!(call(&router, "DELETE", format!("/api/sessions/{id}")).await, StatusCode::CONFLICT);
        assert!(state.sessions.contains(&session_id));
        drop(guard);

        assert_eq!(call(&router, "POST", format!("/api/sessions/{id}/reset")).await, StatusCode::NO_CONTENT);
        assert_eq!(call(&router, "DELETE", format!("/api/sessions/{id}")).await, StatusCode::NO_CONTENT);
        assert_eq!(call(&router, "DELETE", format!("/api/sessions/{id}")).await, StatusCode::NOT_FOUND);
        assert_eq!(call(&router, "GET", format!("/api/sessions/{id}/history")).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reset_clears_document_and_history() {
        let (router, _, completion) = test_app();
        completion.reply(Ok("About A.".to_string()));
        completion.reply(Ok("About B.".to_string()));
        let id = create(&router).await;
        upload(&router, &id, "a.pdf", "application/pdf", "Document A.").await;
        ask(&router, &id, "First?").await;

        assert_eq!(call(&router, "POST", format!("/api/sessions/{id}/reset")).await, StatusCode::NO_CONTENT);
        assert!(history_roles(&router, &id).await.is_empty());

        let (_, body) = upload(&router, &id, "b.pdf", "application/pdf", "Document B.").await;
        assert_eq!(body["status"], "loaded");
        let (status, _) = ask(&router, &id, "Now?").await;
        assert_eq!(status, StatusCode::OK);
        let prompts = completion.prompts();
        assert!(prompts.last().unwrap().contains("Document B."));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blank_questions_and_unknown_sessions_are_rejected() {
        let (router, _, _) = test_app();
        let id = create(&router).await;

        let (status, body) = ask(&router, &id, "   ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "bad_request");

        let (status, body) = ask(&router, &SessionId::new().to_string(), "Hello?").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
        assert_eq!(call(&router, "GET", "/health".to_string()).await, StatusCode::OK);
    }

    #[test]
    fn chat_errors_map_to_statuses() {
        let cases = [
            (ChatError::from(IngestError::NoPages), StatusCode::UNPROCESSABLE_ENTITY),
            (ChatError::from(AssemblyError::NoDocument), StatusCode::CONFLICT),
            (
                ChatError::from(CompletionError::RateLimited {
                    retry_after_secs: None,
                }),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (ChatError::from(CompletionError::Timeout(60)), StatusCode::GATEWAY_TIMEOUT),
            (ChatError::from(CompletionError::Auth { status: 401 }), StatusCode::BAD_GATEWAY),
            (
                ChatError::from(CompletionError::Upstream("boom".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(chat_status(&error), expected, "{error}");
        }
    }

    #[test]
    fn error_body_carries_kind_and_message() {
        let (status, body) = ApiError::Chat(AssemblyError::NoDocument.into()).status_and_body();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.kind, "assembly");
        assert!(body.error.contains("upload a PDF"));

        let (status, body) = ApiError::Busy.status_and_body();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.kind, "busy");
    }

    #[test]
    fn action_guard_releases_on_drop() {
        let sessions = Arc::new(SessionRegistry::new());
        let id = sessions.create();

        let guard = ActionGuard::acquire(&sessions, id).expect("first action should start");
        assert!(matches!(ActionGuard::acquire(&sessions, id), Err(ApiError::Busy)));
        drop(guard);

        assert!(ActionGuard::acquire(&sessions, id).is_ok());
        assert!(matches!(
            ActionGuard::acquire(&sessions, SessionId::new()),
            Err(ApiError::SessionNotFound(_))
        ));
    }

    #[test]
    fn upload_response_reports_status() {
        let response = UploadResponse::from(UploadOutcome::Ignored);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ignored");
        assert!(json.get("document").is_none());
    }
}
