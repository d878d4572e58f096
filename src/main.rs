//! # askdocs CLI
//!
//! The `askdocs` binary is the interface to the assistant. It provides
//! commands for initializing the collection database, ingesting a folder of
//! documents, direct retrieval-augmented queries, the full tool-routing
//! agent loop, and collection health reporting.
//!
//! ## Usage
//!
//! ```bash
//! askdocs --config ./config/askdocs.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `askdocs init` | Create the collection database and schema |
//! | `askdocs ingest <folder>` | Load, chunk, embed, and index documents |
//! | `askdocs query "<question>"` | Answer directly from the knowledge base |
//! | `askdocs ask "<question>"` | Run the tool-routing agent loop |
//! | `askdocs status` | Report collection size and metadata |
//!
//! ## Credentials
//!
//! Credentials come from the environment: `GOOGLE_API_KEY` (gemini
//! embeddings), `OPENAI_API_KEY` (chat model and openai embeddings), and
//! `TAVILY_API_KEY` (web search; optional, the tool degrades to an
//! unavailability message without it).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use askdocs::agent::{final_answer, Router};
use askdocs::config;
use askdocs::db;
use askdocs::error::AssistantError;
use askdocs::index;
use askdocs::ingest::run_ingest;
use askdocs::models::Role;
use askdocs::provider::OpenAiChatModel;
use askdocs::retrieve::Retriever;
use askdocs::tools::Toolbox;
use askdocs::websearch::TavilySearch;

/// askdocs: a retrieval-augmented question-answering assistant for local
/// document folders.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file holding the collection, chunking, retrieval, and model settings.
#[derive(Parser)]
#[command(
    name = "askdocs",
    about = "askdocs: retrieval-augmented question answering over local documents",
    version,
    long_about = "askdocs ingests PDF, text, and markdown files into a persistent vector \
    collection and answers questions by retrieving relevant chunks and synthesizing a grounded \
    answer with a generative model. Questions run through a tool-routing agent loop that can \
    also evaluate arithmetic expressions and search the web."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/askdocs.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the collection database schema.
    ///
    /// Creates the persist directory and the SQLite collection file.
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Ingest a folder of documents into the collection.
    ///
    /// Scans the folder (non-recursively) for `.pdf`, `.txt`, and `.md`
    /// files, chunks and embeds their text, and rebuilds the collection
    /// from scratch. A file that fails to parse is skipped with a warning.
    Ingest {
        /// Folder containing the source documents.
        folder: PathBuf,
    },

    /// Answer a question directly from the knowledge base.
    ///
    /// Retrieves the nearest chunks, formats them as context, and asks the
    /// generative model for a grounded answer with citations. Bypasses the
    /// agent loop.
    Query {
        /// The question to answer.
        question: String,
    },

    /// Ask the assistant, letting it route between tools.
    ///
    /// Runs the bounded agent loop: the model may query the knowledge
    /// base, evaluate arithmetic, or search the web before producing a
    /// final answer.
    Ask {
        /// The message for the assistant.
        question: String,

        /// Print the full conversation trace instead of just the answer.
        #[arg(long)]
        show_turns: bool,
    },

    /// Report collection size and metadata.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg.index, true).await?;
            index::init_schema(&pool).await?;
            pool.close().await;
            println!("Collection database initialized successfully.");
        }

        Commands::Ingest { folder } => {
            run_ingest(&cfg, &folder).await?;
        }

        Commands::Query { question } => {
            let retriever = Retriever::open(&cfg.index, &cfg.embedding).await?;
            let chat: Arc<OpenAiChatModel> = Arc::new(OpenAiChatModel::new(&cfg.chat)?);
            let toolbox = Toolbox::new(None, chat, None, cfg.retrieval.k);

            let result = toolbox.run_rag(&retriever, &question).await?;

            println!("{}", result.answer);
            if !result.context_chunks.is_empty() {
                println!();
                println!("Sources:");
                for chunk in &result.context_chunks {
                    let page = chunk
                        .page
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "N/A".to_string());
                    println!("  [Source: {}, Page: {}]", chunk.source, page);
                }
            }
        }

        Commands::Ask {
            question,
            show_turns,
        } => {
            let retriever = match Retriever::open(&cfg.index, &cfg.embedding).await {
                Ok(r) => Some(r),
                Err(AssistantError::IndexNotFound(name)) => {
                    eprintln!(
                        "Warning: collection '{name}' has not been ingested; \
                         knowledge-base queries are unavailable for this session."
                    );
                    None
                }
                Err(e) => return Err(e.into()),
            };

            let chat = Arc::new(OpenAiChatModel::new(&cfg.chat)?);
            let web = TavilySearch::from_env(&cfg.web_search);
            if web.is_none() {
                tracing::debug!("web search disabled: TAVILY_API_KEY not set");
            }

            let toolbox = Toolbox::new(retriever, chat.clone(), web, cfg.retrieval.k);
            let router = Router::new(chat, toolbox, cfg.chat.max_rounds);

            let turns = router.ask(&question).await;

            if show_turns {
                for turn in &turns {
                    match turn.role {
                        Role::User => {
                            println!("[user] {}", turn.content.as_deref().unwrap_or(""));
                        }
                        Role::Assistant => {
                            if let Some(call) = &turn.tool_call {
                                println!("[assistant] calling {}({})", call.name, call.arguments);
                            } else {
                                println!("[assistant] {}", turn.content.as_deref().unwrap_or(""));
                            }
                        }
                        Role::Tool => {
                            println!("[{}] {}", turn.name, turn.content.as_deref().unwrap_or(""));
                        }
                    }
                }
                println!();
            }

            println!("{}", final_answer(&turns));
        }

        Commands::Status => match index::open(&cfg.index).await {
            Ok(idx) => {
                let count = idx.count().await?;
                let meta = idx.meta().await?;

                println!("collection: {}", cfg.index.collection);
                println!("  path: {}", db::collection_path(&cfg.index).display());
                println!("  entries: {count}");
                if let Some(meta) = meta {
                    let date = chrono::DateTime::from_timestamp(meta.created_at, 0)
                        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        .unwrap_or_default();
                    println!("  embedding model: {}", meta.embedding_model);
                    println!("  dims: {}", meta.dims);
                    println!("  ingested at: {date}");
                }
                idx.close().await;
            }
            Err(AssistantError::IndexNotFound(name)) => {
                println!("collection '{name}' not found; run `askdocs ingest <folder>` first");
            }
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}
