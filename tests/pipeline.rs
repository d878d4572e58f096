//! End-to-end pipeline tests against the library: load, chunk, index,
//! search. Embedding vectors are synthesized locally so no network or
//! credentials are needed.

use std::fs;
use std::path::Path;

use askdocs::chunk::chunk_units;
use askdocs::config::IndexConfig;
use askdocs::index;
use askdocs::loader::load_dir;
use tempfile::TempDir;

fn index_config(root: &Path) -> IndexConfig {
    IndexConfig {
        persist_dir: root.join("vector_store"),
        collection: "test_docs".to_string(),
    }
}

/// Deterministic stand-in embedding: character histogram over a few buckets.
fn fake_embed(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 8];
    for (i, c) in text.chars().enumerate() {
        v[(c as usize + i) % 8] += 1.0;
    }
    v
}

#[tokio::test]
async fn test_single_file_round_trip() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), "hello world").unwrap();

    // One file, one unit.
    let outcome = load_dir(&data).unwrap();
    assert_eq!(outcome.files_found, 1);
    assert_eq!(outcome.units.len(), 1);

    // Content far below chunk_size: exactly one chunk.
    let chunks = chunk_units(&outcome.units, 1000, 200);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "hello world");
    assert_eq!(chunks[0].source, "a.txt");

    // Index it and confirm the round trip.
    let config = index_config(tmp.path());
    let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| fake_embed(&c.content)).collect();
    let written = index::rebuild(&config, &chunks, &vectors, "fake-model", 8)
        .await
        .unwrap();
    assert_eq!(written, 1);

    let idx = index::open(&config).await.unwrap();
    assert_eq!(idx.count().await.unwrap(), 1);

    let results = idx.search(&fake_embed("hello world"), 3).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.content, "hello world");
    assert!(results[0].score > 0.99);
    idx.close().await;
}

#[tokio::test]
async fn test_search_returns_min_of_k_and_count() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir(&data).unwrap();
    for i in 0..4 {
        fs::write(
            data.join(format!("doc{i}.md")),
            format!("Document number {i} talks about topic {i}."),
        )
        .unwrap();
    }

    let outcome = load_dir(&data).unwrap();
    let chunks = chunk_units(&outcome.units, 1000, 200);
    assert_eq!(chunks.len(), 4);

    let config = index_config(tmp.path());
    let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| fake_embed(&c.content)).collect();
    index::rebuild(&config, &chunks, &vectors, "fake-model", 8)
        .await
        .unwrap();

    let idx = index::open(&config).await.unwrap();
    let query = fake_embed("Document number 2");

    // k below count: exactly k results.
    assert_eq!(idx.search(&query, 2).await.unwrap().len(), 2);
    // k above count: all entries, never more.
    assert_eq!(idx.search(&query, 50).await.unwrap().len(), 4);
    // Nearest first.
    let results = idx.search(&query, 4).await.unwrap();
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    idx.close().await;
}

#[tokio::test]
async fn test_reingest_replaces_collection() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("one.txt"), "first generation of content").unwrap();
    fs::write(data.join("two.txt"), "more first generation content").unwrap();

    let config = index_config(tmp.path());

    let outcome = load_dir(&data).unwrap();
    let chunks = chunk_units(&outcome.units, 1000, 200);
    let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| fake_embed(&c.content)).collect();
    index::rebuild(&config, &chunks, &vectors, "fake-model", 8)
        .await
        .unwrap();

    // Replace the folder contents and re-ingest: the collection holds only
    // the new generation, no leftovers.
    fs::remove_file(data.join("one.txt")).unwrap();
    fs::remove_file(data.join("two.txt")).unwrap();
    fs::write(data.join("three.txt"), "second generation").unwrap();

    let outcome = load_dir(&data).unwrap();
    let chunks = chunk_units(&outcome.units, 1000, 200);
    let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| fake_embed(&c.content)).collect();
    index::rebuild(&config, &chunks, &vectors, "fake-model", 8)
        .await
        .unwrap();

    let idx = index::open(&config).await.unwrap();
    assert_eq!(idx.count().await.unwrap(), 1);
    let results = idx.search(&fake_embed("second generation"), 10).await.unwrap();
    assert_eq!(results[0].chunk.source, "three.txt");
    idx.close().await;
}

#[tokio::test]
async fn test_provenance_survives_the_pipeline() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir(&data).unwrap();

    let body = "A sentence about alpha. ".repeat(80);
    fs::write(data.join("long.md"), &body).unwrap();

    let outcome = load_dir(&data).unwrap();
    let chunks = chunk_units(&outcome.units, 400, 100);
    assert!(chunks.len() > 1, "long document should produce several chunks");

    let config = index_config(tmp.path());
    let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| fake_embed(&c.content)).collect();
    index::rebuild(&config, &chunks, &vectors, "fake-model", 8)
        .await
        .unwrap();

    let idx = index::open(&config).await.unwrap();
    let results = idx
        .search(&fake_embed("alpha"), chunks.len())
        .await
        .unwrap();
    for sc in &results {
        assert_eq!(sc.chunk.source, "long.md");
        assert_eq!(sc.chunk.page, None);
    }
    idx.close().await;
}
