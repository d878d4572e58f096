//! Top-k retrieval over the vector index.
//!
//! Embeds the query with the configured provider and asks the index for the
//! nearest chunks. Read-only: one retriever can serve any number of queries
//! against the same open collection.

use crate::config::{EmbeddingConfig, IndexConfig};
use crate::embedding::{self, EmbeddingProvider};
use crate::error::Result;
use crate::index::{self, Index};
use crate::models::Chunk;

pub struct Retriever {
    index: Index,
    provider: Box<dyn EmbeddingProvider>,
    embedding: EmbeddingConfig,
}

impl Retriever {
    /// Open the collection and construct the embedding provider.
    ///
    /// Fails when the collection was never ingested or the embedding
    /// credential is missing.
    pub async fn open(index_config: &IndexConfig, embedding: &EmbeddingConfig) -> Result<Self> {
        let index = index::open(index_config).await?;
        let provider = embedding::create_provider(embedding)?;
        Ok(Self {
            index,
            provider,
            embedding: embedding.clone(),
        })
    }

    /// Retrieve the `k` chunks nearest to `query`, nearest first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        let query_vec =
            embedding::embed_query(self.provider.as_ref(), &self.embedding, query).await?;
        let scored = self.index.search(&query_vec, k).await?;
        tracing::debug!("retrieved {} chunks for query", scored.len());
        Ok(scored.into_iter().map(|sc| sc.chunk).collect())
    }

    /// Number of entries in the underlying collection.
    pub async fn count(&self) -> Result<i64> {
        self.index.count().await
    }
}
