//! Embedding provider abstraction and implementations.
//!
//! Defines the [`EmbeddingProvider`] trait and two concrete backends:
//! - **[`GeminiProvider`]** calls the Google Generative Language
//!   `batchEmbedContents` endpoint. Requires `GOOGLE_API_KEY`.
//! - **[`OpenAiProvider`]** calls the OpenAI `POST /v1/embeddings` endpoint.
//!   Requires `OPENAI_API_KEY`.
//!
//! Both are pure adapters: text in, vectors out, order preserving. A missing
//! credential fails at provider construction with a configuration error.
//!
//! Also provides vector utilities for the SQLite-backed index:
//! - [`vec_to_blob`] / [`blob_to_vec`] encode vectors as little-endian f32
//!   bytes for BLOB storage
//! - [`cosine_similarity`] scores a query vector against stored vectors
//!
//! # Retry Strategy
//!
//! Transient failures are retried with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error): retry
//! - HTTP 4xx (client error, not 429): fail immediately
//! - Network errors: retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{AssistantError, Result};

/// Interface every embedding backend implements.
///
/// The actual embedding computation is performed by [`embed_texts`]
/// (kept as a free function due to async trait limitations).
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier (e.g. `"models/embedding-001"`).
    fn model_name(&self) -> &str;
    /// Embedding vector dimensionality (e.g. `768`).
    fn dims(&self) -> usize;
}

/// Create the appropriate [`EmbeddingProvider`] from configuration.
///
/// Fails with a configuration error when the backing credential is absent
/// from the environment.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "gemini" => Ok(Box::new(GeminiProvider::new(config)?)),
        "openai" => Ok(Box::new(OpenAiProvider::new(config)?)),
        other => Err(AssistantError::Configuration(format!(
            "unknown embedding provider: '{other}'"
        ))),
    }
}

/// Embed a batch of texts using the configured provider.
///
/// Returns one vector per input text, in input order.
pub async fn embed_texts(
    _provider: &dyn EmbeddingProvider,
    config: &EmbeddingConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    match config.provider.as_str() {
        "gemini" => embed_gemini(config, texts).await,
        "openai" => embed_openai(config, texts).await,
        other => Err(AssistantError::Configuration(format!(
            "unknown embedding provider: '{other}'"
        ))),
    }
}

/// Embed a single query text.
///
/// Convenience wrapper around [`embed_texts`] for query-time use.
pub async fn embed_query(
    provider: &dyn EmbeddingProvider,
    config: &EmbeddingConfig,
    text: &str,
) -> Result<Vec<f32>> {
    let results = embed_texts(provider, config, &[text.to_string()]).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| AssistantError::Embedding("empty embedding response".to_string()))
}

// ============ Gemini Provider ============

/// Embedding provider using the Google Generative Language API.
pub struct GeminiProvider {
    model: String,
    dims: usize,
}

impl GeminiProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        if std::env::var("GOOGLE_API_KEY").is_err() {
            return Err(AssistantError::Configuration(
                "GOOGLE_API_KEY environment variable not set".to_string(),
            ));
        }
        Ok(Self {
            model: config.model.clone(),
            dims: config.dims,
        })
    }
}

impl EmbeddingProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
}

/// Call `batchEmbedContents` with retry/backoff.
async fn embed_gemini(config: &EmbeddingConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let api_key = std::env::var("GOOGLE_API_KEY")
        .map_err(|_| AssistantError::Configuration("GOOGLE_API_KEY not set".to_string()))?;

    let client = http_client(config.timeout_secs)?;

    // Model names carry the "models/" prefix (e.g. "models/embedding-001").
    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/{}:batchEmbedContents?key={}",
        config.model, api_key
    );

    let requests: Vec<serde_json::Value> = texts
        .iter()
        .map(|text| {
            serde_json::json!({
                "model": config.model,
                "content": { "parts": [{ "text": text }] },
            })
        })
        .collect();
    let body = serde_json::json!({ "requests": requests });

    let json = post_with_retry(&client, &url, &body, config.max_retries, "Gemini").await?;
    parse_gemini_response(&json, texts.len())
}

fn parse_gemini_response(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            AssistantError::Embedding("invalid Gemini response: missing embeddings array".into())
        })?;

    let mut result = Vec::with_capacity(embeddings.len());
    for item in embeddings {
        let values = item.get("values").and_then(|v| v.as_array()).ok_or_else(|| {
            AssistantError::Embedding("invalid Gemini response: missing values".into())
        })?;
        let vec: Vec<f32> = values
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        result.push(vec);
    }

    if result.len() != expected {
        return Err(AssistantError::Embedding(format!(
            "Gemini returned {} embeddings for {} inputs",
            result.len(),
            expected
        )));
    }
    Ok(result)
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI embeddings API.
pub struct OpenAiProvider {
    model: String,
    dims: usize,
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        if std::env::var("OPENAI_API_KEY").is_err() {
            return Err(AssistantError::Configuration(
                "OPENAI_API_KEY environment variable not set".to_string(),
            ));
        }
        Ok(Self {
            model: config.model.clone(),
            dims: config.dims,
        })
    }
}

impl EmbeddingProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
}

/// Call the OpenAI embeddings API with retry/backoff.
async fn embed_openai(config: &EmbeddingConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| AssistantError::Configuration("OPENAI_API_KEY not set".to_string()))?;

    let client = http_client(config.timeout_secs)?;

    let body = serde_json::json!({
        "model": config.model,
        "input": texts,
    });

    let json = post_with_retry_auth(
        &client,
        "https://api.openai.com/v1/embeddings",
        &body,
        Some(&api_key),
        config.max_retries,
        "OpenAI",
    )
    .await?;
    parse_openai_response(&json, texts.len())
}

fn parse_openai_response(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let data = json.get("data").and_then(|d| d.as_array()).ok_or_else(|| {
        AssistantError::Embedding("invalid OpenAI response: missing data array".into())
    })?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                AssistantError::Embedding("invalid OpenAI response: missing embedding".into())
            })?;
        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        embeddings.push(vec);
    }

    if embeddings.len() != expected {
        return Err(AssistantError::Embedding(format!(
            "OpenAI returned {} embeddings for {} inputs",
            embeddings.len(),
            expected
        )));
    }
    Ok(embeddings)
}

// ============ Shared HTTP plumbing ============

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AssistantError::Embedding(e.to_string()))
}

async fn post_with_retry(
    client: &reqwest::Client,
    url: &str,
    body: &serde_json::Value,
    max_retries: u32,
    label: &str,
) -> Result<serde_json::Value> {
    post_with_retry_auth(client, url, body, None, max_retries, label).await
}

async fn post_with_retry_auth(
    client: &reqwest::Client,
    url: &str,
    body: &serde_json::Value,
    bearer: Option<&str>,
    max_retries: u32,
    label: &str,
) -> Result<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let mut req = client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(token) = bearer {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        match req.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response
                        .json()
                        .await
                        .map_err(|e| AssistantError::Embedding(e.to_string()));
                }

                // Rate limited or server error: retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(AssistantError::Embedding(format!(
                        "{label} API error {status}: {body_text}"
                    )));
                    continue;
                }

                // Client error (not 429): don't retry
                let body_text = response.text().await.unwrap_or_default();
                return Err(AssistantError::Embedding(format!(
                    "{label} API error {status}: {body_text}"
                )));
            }
            Err(e) => {
                last_err = Some(AssistantError::Embedding(e.to_string()));
                continue;
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| AssistantError::Embedding(format!("{label} embedding failed"))))
}

// ============ Vector utilities ============

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// Each `f32` is stored as 4 bytes in little-endian order, producing a
/// BLOB of `vec.len() x 4` bytes.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector. Reverses [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`; `0.0` for empty vectors or vectors of
/// different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
