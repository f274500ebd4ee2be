mod repl;
mod server;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_chat_core::{
    Assistant, AzureOpenAiClient, ChunkingConfig, CompletionConfig, IngestionOptions,
    LopdfExtractor, PromptTemplate, DEFAULT_ASSISTANT_NAME,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-chat", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Name the assistant introduces itself with in every prompt.
    #[arg(long, env = "PDF_CHAT_ASSISTANT_NAME", default_value = DEFAULT_ASSISTANT_NAME, global = true)]
    assistant_name: String,

    /// Maximum chunk length in characters.
    #[arg(long, default_value = "2000", global = true)]
    chunk_max_chars: usize,

    /// Characters shared by consecutive chunks.
    #[arg(long, default_value = "200", global = true)]
    chunk_overlap_chars: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat about one PDF in the terminal.
    Chat {
        /// PDF to load before the first prompt. Use /upload otherwise.
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Load a PDF, ask one question and print the answer.
    Ask {
        /// PDF to read.
        #[arg(long)]
        pdf: PathBuf,
        /// Question about the document.
        #[arg(long)]
        question: String,
    },
    /// Serve the chat over HTTP with one isolated session per client.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
        /// Largest accepted upload body in bytes.
        #[arg(long, default_value_t = 20 * 1024 * 1024)]
        max_upload_bytes: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let options = IngestionOptions {
        chunk_max_chars: cli.chunk_max_chars,
        chunk_overlap_chars: cli.chunk_overlap_chars,
    };
    ChunkingConfig::from(options.clone())
        .validate()
        .context("invalid chunking options")?;

    let config = CompletionConfig::from_env().context("completion service is not configured")?;
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        endpoint = %config.endpoint,
        deployment = %config.deployment,
        "pdf-chat boot"
    );

    let client = AzureOpenAiClient::new(config).context("failed to build completion client")?;
    let assistant = Assistant::with_extractor(
        client,
        LopdfExtractor,
        PromptTemplate::new(cli.assistant_name),
        options,
    );

    match cli.command {
        Command::Chat { pdf } => repl::run_chat(&assistant, pdf).await,
        Command::Ask { pdf, question } => repl::run_ask(&assistant, &pdf, &question).await,
        Command::Serve {
            bind,
            max_upload_bytes,
        } => {
            server::serve(
                assistant,
                server::ServerConfig {
                    bind,
                    max_upload_bytes,
                },
            )
            .await
        }
    }
}
