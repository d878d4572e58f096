//! Persistent vector index over a named collection.
//!
//! Stores `(id, chunk, vector)` rows in SQLite and answers nearest-neighbor
//! queries by scoring every stored vector with cosine similarity in process.
//! Rebuilds are full replacements: one transaction deletes the previous
//! contents and inserts the fresh entries, so readers either see the old
//! collection or the new one.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::IndexConfig;
use crate::db;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::error::{AssistantError, Result};
use crate::models::{Chunk, FileType, ScoredChunk};

/// An open collection handle for querying.
#[derive(Debug)]
pub struct Index {
    pool: SqlitePool,
    collection: String,
}

/// Collection-level metadata recorded at rebuild time.
#[derive(Debug, Clone)]
pub struct CollectionMeta {
    pub embedding_model: String,
    pub dims: i64,
    pub created_at: i64,
}

/// Create the collection schema. Idempotent.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            page INTEGER,
            file_type TEXT NOT NULL,
            start_offset INTEGER NOT NULL,
            content TEXT NOT NULL,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collection_meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            embedding_model TEXT NOT NULL,
            dims INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_source ON entries(source)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Replace the collection's contents with freshly embedded chunks.
///
/// Deletes any existing entries and inserts the new ones inside a single
/// transaction; on any failure the transaction rolls back and the previous
/// contents remain authoritative. Returns the number of entries written.
pub async fn rebuild(
    config: &IndexConfig,
    chunks: &[Chunk],
    vectors: &[Vec<f32>],
    embedding_model: &str,
    dims: usize,
) -> Result<usize> {
    if chunks.len() != vectors.len() {
        return Err(AssistantError::Embedding(format!(
            "embedding count mismatch: {} chunks, {} vectors",
            chunks.len(),
            vectors.len()
        )));
    }

    let pool = db::connect(config, true).await?;
    init_schema(&pool).await?;

    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM entries").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM collection_meta")
        .execute(&mut *tx)
        .await?;

    for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
        sqlx::query(
            r#"
            INSERT INTO entries (id, source, page, file_type, start_offset, content, embedding)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&chunk.source)
        .bind(chunk.page)
        .bind(chunk.file_type.as_str())
        .bind(chunk.start_offset as i64)
        .bind(&chunk.content)
        .bind(vec_to_blob(vector))
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "INSERT INTO collection_meta (id, embedding_model, dims, created_at) VALUES (1, ?, ?, ?)",
    )
    .bind(embedding_model)
    .bind(dims as i64)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    pool.close().await;

    Ok(chunks.len())
}

/// Open an existing collection for querying.
///
/// Fails with [`AssistantError::IndexNotFound`] when the collection was
/// never ingested.
pub async fn open(config: &IndexConfig) -> Result<Index> {
    let pool = db::connect(config, false).await?;
    init_schema(&pool).await?;
    Ok(Index {
        pool,
        collection: config.collection.clone(),
    })
}

impl Index {
    /// Collection name this handle was opened for.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Nearest-neighbor search: scores every entry against `query_vec` and
    /// returns at most `k` results, best first. Ties break on entry id so
    /// the ordering is deterministic.
    pub async fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let rows = sqlx::query(
            "SELECT id, source, page, file_type, start_offset, content, embedding FROM entries",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<(String, ScoredChunk)> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = blob_to_vec(&blob);
                let score = cosine_similarity(query_vec, &vec);
                let file_type: String = row.get("file_type");
                let start_offset: i64 = row.get("start_offset");
                (
                    row.get("id"),
                    ScoredChunk {
                        chunk: Chunk {
                            content: row.get("content"),
                            source: row.get("source"),
                            page: row.get("page"),
                            file_type: FileType::from_extension(&file_type)
                                .unwrap_or(FileType::Txt),
                            start_offset: start_offset as usize,
                        },
                        score,
                    },
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, sc)| sc).collect())
    }

    /// Number of entries in the collection. Used for health reporting.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Metadata recorded by the last rebuild, if any.
    pub async fn meta(&self) -> Result<Option<CollectionMeta>> {
        let row = sqlx::query(
            "SELECT embedding_model, dims, created_at FROM collection_meta WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| CollectionMeta {
            embedding_model: r.get("embedding_model"),
            dims: r.get("dims"),
            created_at: r.get("created_at"),
        }))
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn test_config(dir: &Path) -> IndexConfig {
        IndexConfig {
            persist_dir: dir.to_path_buf(),
            collection: "test_docs".to_string(),
        }
    }

    fn chunk(content: &str, source: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            source: source.to_string(),
            page: Some(1),
            file_type: FileType::Pdf,
            start_offset: 0,
        }
    }

    #[tokio::test]
    async fn test_rebuild_then_search() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());

        let chunks = vec![chunk("alpha", "a.pdf"), chunk("beta", "b.pdf")];
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let written = rebuild(&config, &chunks, &vectors, "test-model", 2)
            .await
            .unwrap();
        assert_eq!(written, 2);

        let index = open(&config).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 2);

        let results = index.search(&[1.0, 0.1], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "alpha");
        assert!(results[0].score > results[1].score);
        index.close().await;
    }

    #[tokio::test]
    async fn test_search_bounded_by_k_and_count() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());

        let chunks: Vec<Chunk> = (0..5).map(|i| chunk(&format!("c{i}"), "a.pdf")).collect();
        let vectors: Vec<Vec<f32>> = (0..5).map(|i| vec![i as f32, 1.0]).collect();
        rebuild(&config, &chunks, &vectors, "test-model", 2)
            .await
            .unwrap();

        let index = open(&config).await.unwrap();
        assert_eq!(index.search(&[1.0, 1.0], 3).await.unwrap().len(), 3);
        // Fewer entries than k: returns all of them.
        assert_eq!(index.search(&[1.0, 1.0], 10).await.unwrap().len(), 5);
        index.close().await;
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_contents() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());

        let first = vec![chunk("old one", "old.pdf"), chunk("old two", "old.pdf")];
        rebuild(&config, &first, &[vec![1.0], vec![0.5]], "m", 1)
            .await
            .unwrap();

        let second = vec![chunk("fresh", "new.pdf")];
        rebuild(&config, &second, &[vec![1.0]], "m", 1).await.unwrap();

        let index = open(&config).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
        let results = index.search(&[1.0], 5).await.unwrap();
        assert_eq!(results[0].chunk.source, "new.pdf");
        index.close().await;
    }

    #[tokio::test]
    async fn test_rebuild_rejects_count_mismatch() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());

        let err = rebuild(&config, &[chunk("x", "a.pdf")], &[], "m", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_open_missing_collection() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let err = open(&config).await.unwrap_err();
        assert!(matches!(err, AssistantError::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn test_meta_recorded() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());

        rebuild(&config, &[chunk("x", "a.pdf")], &[vec![1.0]], "models/embedding-001", 768)
            .await
            .unwrap();

        let index = open(&config).await.unwrap();
        let meta = index.meta().await.unwrap().unwrap();
        assert_eq!(meta.embedding_model, "models/embedding-001");
        assert_eq!(meta.dims, 768);
        assert!(meta.created_at > 0);
        index.close().await;
    }
}
