//! Error taxonomy for the assistant.
//!
//! Adapter-level failures are typed so callers can tell a missing credential
//! apart from a failed network call or an absent collection. Per-file load
//! errors are recorded and skipped; index and model errors abort the single
//! operation but never the process; tools convert their own failures into
//! plain strings for the model.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    /// Missing or invalid credential, model identifier, or config value.
    /// Fatal at startup for required settings; feature-disabling for
    /// optional ones (web search).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A single source file failed to parse. Never fatal to a batch.
    #[error("failed to load {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    /// The embedding API call failed after retries.
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// The generative model call failed.
    #[error("generation request failed: {0}")]
    Generation(String),

    /// The web search provider call failed.
    #[error("web search failed: {0}")]
    SearchProvider(String),

    /// A tool rejected malformed input. Surfaced to the model as a string
    /// result, not an error.
    #[error("tool error: {0}")]
    Tool(String),

    /// The named collection has never been ingested.
    #[error("collection '{0}' not found; run `askdocs ingest <folder>` first")]
    IndexNotFound(String),

    #[error("index error: {0}")]
    Index(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AssistantError>;
