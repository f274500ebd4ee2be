use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_chat_core::{
    render_transcript, render_turn, Assistant, ChatError, CompletionService, IngestError,
    PdfExtractor, Session, UploadOutcome, UploadedDocument,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands:
  /upload <path>   load a PDF (only the first upload of a session is used)
  /history         print the conversation so far
  /reset           forget the document and the conversation
  /quit            leave
anything else is sent as a question";

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Upload(&'a str),
    History,
    Reset,
    Help,
    Quit,
    Unknown(&'a str),
    Question(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    if !trimmed.starts_with('/') {
        return Input::Question(trimmed);
    }

    let (command, rest) = trimmed
        .split_once(char::is_whitespace)
        .map(|(command, rest)| (command, rest.trim()))
        .unwrap_or((trimmed, ""));

    match command {
        "/upload" if !rest.is_empty() => Input::Upload(rest),
        "/history" => Input::History,
        "/reset" => Input::Reset,
        "/help" => Input::Help,
        "/quit" | "/exit" => Input::Quit,
        _ => Input::Unknown(command),
    }
}

async fn read_pdf(path: &Path) -> Result<UploadedDocument, ChatError> {
    let bytes = tokio::fs::read(path).await.map_err(IngestError::Io)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string);
    Ok(UploadedDocument::from_parts(bytes, None, file_name))
}

async fn upload_path<C, E>(
    assistant: &Assistant<C, E>,
    session: &mut Session,
    path: &Path,
) -> Result<UploadOutcome, ChatError>
where
    C: CompletionService,
    E: PdfExtractor,
{
    if session.has_context() {
        return Ok(UploadOutcome::Ignored);
    }
    let document = read_pdf(path).await?;
    tokio::task::block_in_place(|| assistant.upload(session, &document))
}

fn report_upload(outcome: &UploadOutcome) {
    match outcome {
        UploadOutcome::Loaded(summary) => println!(
            "loaded {} ({} pages, {} chunks, {} characters)",
            summary.file_name.as_deref().unwrap_or("document"),
            summary.page_count,
            summary.chunk_count,
            summary.context_chars
        ),
        UploadOutcome::Ignored => {
            println!("a document is already loaded; use /reset to start over with another one")
        }
    }
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

async fn answer_with_spinner<C, E>(
    assistant: &Assistant<C, E>,
    session: &mut Session,
    question: &str,
) -> Result<String, ChatError>
where
    C: CompletionService,
    E: PdfExtractor,
{
    let spinner = thinking_spinner();
    let result = assistant.ask(session, question).await;
    spinner.finish_and_clear();
    result
}

pub async fn run_chat<C, E>(assistant: &Assistant<C, E>, pdf: Option<PathBuf>) -> anyhow::Result<()>
where
    C: CompletionService,
    E: PdfExtractor,
{
    let mut session = Session::new();
    let name = assistant.assistant_name().to_string();

    println!("{name}: upload a PDF with /upload <path>, then ask questions. /help lists commands.");

    if let Some(path) = pdf {
        match upload_path(assistant, &mut session, &path).await {
            Ok(outcome) => report_upload(&outcome),
            Err(error) => println!("error: {error}"),
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await.context("failed to read from stdin")? else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => {}
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
            Input::Unknown(command) => println!("unknown command {command}; try /help"),
            Input::History => {
                let transcript = render_transcript(session.history(), &name);
                if transcript.is_empty() {
                    println!("(no messages yet)");
                } else {
                    println!("{transcript}");
                }
            }
            Input::Reset => {
                session.reset();
                println!("session cleared");
            }
            Input::Upload(raw_path) => {
                match upload_path(assistant, &mut session, Path::new(raw_path)).await {
                    Ok(outcome) => report_upload(&outcome),
                    Err(error) => println!("error: {error}"),
                }
            }
            Input::Question(question) => {
                match answer_with_spinner(assistant, &mut session, question).await {
                    Ok(_) => {
                        if let Some(turn) = session.history().last() {
                            println!("\n{}", render_turn(turn, &name));
                        }
                    }
                    Err(error) => println!("error: {error}"),
                }
            }
        }
    }

    Ok(())
}

pub async fn run_ask<C, E>(assistant: &Assistant<C, E>, pdf: &Path, question: &str) -> anyhow::Result<()>
where
    C: CompletionService,
    E: PdfExtractor,
{
    let mut session = Session::new();
    let outcome = upload_path(assistant, &mut session, pdf)
        .await
        .with_context(|| format!("failed to load {}", pdf.display()))?;
    if let UploadOutcome::Loaded(summary) = &outcome {
        tracing::info!(chunks = summary.chunk_count, "document ready");
    }

    let answer = answer_with_spinner(assistant, &mut session, question).await?;
    println!("{answer}");
    Ok(())
}
