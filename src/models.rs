//! Core data models used throughout the assistant.
//!
//! These types represent the text units, chunks, and conversation turns that
//! flow through the ingestion and question-answering pipelines.

use serde::{Deserialize, Serialize};

/// Placeholder source name backfilled onto chunks whose parent unit carries
/// no usable source field.
pub const UNKNOWN_SOURCE: &str = "Unknown_Source_File";

/// Supported source file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Txt,
    Md,
}

impl FileType {
    /// Map a file extension (lowercased, without the dot) to a file type.
    pub fn from_extension(ext: &str) -> Option<FileType> {
        match ext {
            "pdf" => Some(FileType::Pdf),
            "txt" => Some(FileType::Txt),
            "md" => Some(FileType::Md),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Txt => "txt",
            FileType::Md => "md",
        }
    }
}

/// One logical unit of source content produced by the loader.
///
/// One PDF page becomes one unit; one txt/md file becomes one unit.
/// Immutable once created.
#[derive(Debug, Clone)]
pub struct TextUnit {
    pub content: String,
    /// Source file name (not the full path).
    pub source: String,
    /// 1-based page number for PDF pages; `None` for whole-file units.
    pub page: Option<i64>,
    pub file_type: FileType,
}

/// A fragment of a [`TextUnit`], the unit of retrieval.
///
/// Chunks inherit their parent's provenance and record the character offset
/// where the fragment starts. Chunks never cross unit boundaries and are
/// regenerated wholesale on re-ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub source: String,
    pub page: Option<i64>,
    pub file_type: FileType,
    /// Character offset of this chunk within the parent unit's content.
    pub start_offset: usize,
}

/// A chunk paired with its similarity score from a vector search.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model: the tool name plus its JSON arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: serde_json::Value,
}

/// One exchange in the agent loop, in a vendor-neutral shape.
///
/// Owned by the router for the lifetime of one `ask()` call; the chat model
/// adapter converts turns into its provider's wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub name: String,
    pub content: Option<String>,
    pub tool_call: Option<ToolInvocation>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            name: "user".to_string(),
            content: Some(content.into()),
            tool_call: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            name: "assistant".to_string(),
            content: Some(content.into()),
            tool_call: None,
        }
    }

    pub fn assistant_tool_call(content: Option<String>, call: ToolInvocation) -> Self {
        Self {
            role: Role::Assistant,
            name: "assistant".to_string(),
            content,
            tool_call: Some(call),
        }
    }

    pub fn tool(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            name: name.into(),
            content: Some(content.into()),
            tool_call: None,
        }
    }
}

/// Result of one knowledge-base query: question, retrieved context, answer.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub question: String,
    pub context_chunks: Vec<Chunk>,
    pub answer: String,
}

/// Counters reported by one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    pub files_found: usize,
    pub files_loaded: usize,
    pub files_failed: usize,
    pub chunks_created: usize,
    pub items_indexed: usize,
}
