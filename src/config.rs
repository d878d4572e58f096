use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub index: IndexConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub chat: ChatConfig,
    #[serde(default)]
    pub web_search: WebSearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Directory holding the persisted collection database.
    pub persist_dir: PathBuf,
    /// Collection name; stable across ingestion runs.
    pub collection: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Number of nearest chunks retrieved per query.
    #[serde(default = "default_k")]
    pub k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: default_k() }
    }
}

fn default_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// Embedding backend: `gemini` or `openai`.
    pub provider: String,
    /// Model identifier (e.g. `models/embedding-001`, `text-embedding-3-small`).
    pub model: String,
    /// Embedding vector dimensionality.
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embed_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_embed_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Generative model identifier (OpenAI-compatible chat completions).
    pub model: String,
    /// Sampling temperature. Low by default: factuality over creativity.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum model/tool exchanges per `ask()` before forced termination.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.1
}
fn default_max_rounds() -> usize {
    5
}
fn default_chat_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebSearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

fn default_max_results() -> usize {
    3
}
fn default_search_timeout_secs() -> u64 {
    15
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate index
    if config.index.collection.trim().is_empty() {
        anyhow::bail!("index.collection must not be empty");
    }

    // Validate chunking
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.chunk_overlap,
            config.chunking.chunk_size
        );
    }

    // Validate retrieval
    if config.retrieval.k < 1 {
        anyhow::bail!("retrieval.k must be >= 1");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "gemini" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be gemini or openai.",
            other
        ),
    }
    if config.embedding.model.trim().is_empty() {
        anyhow::bail!("embedding.model must not be empty");
    }
    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }

    // Validate chat
    if config.chat.model.trim().is_empty() {
        anyhow::bail!("chat.model must not be empty");
    }
    if config.chat.max_rounds < 1 {
        anyhow::bail!("chat.max_rounds must be >= 1");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("askdocs.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    const VALID: &str = r#"
[index]
persist_dir = "vector_store"
collection = "docs"

[embedding]
provider = "gemini"
model = "models/embedding-001"
dims = 768

[chat]
model = "gpt-4o-mini"
"#;

    #[test]
    fn test_valid_config_with_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_config(tmp.path(), VALID);
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.chunking.chunk_size, 1000);
        assert_eq!(cfg.chunking.chunk_overlap, 200);
        assert_eq!(cfg.retrieval.k, 3);
        assert_eq!(cfg.chat.max_rounds, 5);
        assert!((cfg.chat.temperature - 0.1).abs() < 1e-6);
        assert_eq!(cfg.web_search.max_results, 3);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let body = VALID.replace(
            "[embedding]",
            "[chunking]\nchunk_size = 200\nchunk_overlap = 200\n\n[embedding]",
        );
        let path = write_config(tmp.path(), &body);
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_unknown_embedding_provider_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let body = VALID.replace("provider = \"gemini\"", "provider = \"cohere\"");
        let path = write_config(tmp.path(), &body);
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_config(Path::new("/nonexistent/askdocs.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_zero_dims_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let body = VALID.replace("dims = 768", "dims = 0");
        let path = write_config(tmp.path(), &body);
        assert!(load_config(&path).is_err());
    }
}
