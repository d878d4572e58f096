//! Ingestion pipeline orchestration.
//!
//! Runs the full offline path for one folder: load documents, chunk them,
//! embed every chunk, and rebuild the collection. Stages run strictly in
//! order and the pipeline stops at the first failing stage, so a failed
//! embedding run never touches the persisted collection.

use anyhow::{Context, Result};
use std::path::Path;

use crate::chunk::chunk_units;
use crate::config::Config;
use crate::embedding;
use crate::index;
use crate::loader;
use crate::models::IngestStats;

/// Load, chunk, embed, and index every supported document under `folder`.
///
/// A full rebuild: the previous collection contents are replaced, not
/// merged. Per-file load failures are reported and skipped; embedding or
/// index failures abort the run before the collection is modified.
pub async fn run_ingest(config: &Config, folder: &Path) -> Result<IngestStats> {
    // Stage 1: load
    let outcome = loader::load_dir(folder).context("document loading failed")?;
    for failure in &outcome.failures {
        eprintln!(
            "Warning: skipped {}: {}",
            failure.path.display(),
            failure.reason
        );
    }

    let mut stats = IngestStats {
        files_found: outcome.files_found,
        files_loaded: outcome.files_loaded,
        files_failed: outcome.failures.len(),
        ..Default::default()
    };

    if outcome.units.is_empty() {
        print_report(config, &stats, "no supported documents found; collection unchanged");
        return Ok(stats);
    }

    // Stage 2: chunk
    let chunks = chunk_units(
        &outcome.units,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
    );
    stats.chunks_created = chunks.len();

    // Stage 3: embed
    let provider =
        embedding::create_provider(&config.embedding).context("embedding provider setup failed")?;

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(config.embedding.batch_size) {
        let batch_vectors = embedding::embed_texts(provider.as_ref(), &config.embedding, batch)
            .await
            .context("embedding failed")?;
        vectors.extend(batch_vectors);
    }

    // Stage 4: rebuild the collection
    let written = index::rebuild(
        &config.index,
        &chunks,
        &vectors,
        provider.model_name(),
        provider.dims(),
    )
    .await
    .context("index rebuild failed")?;
    stats.items_indexed = written;

    print_report(config, &stats, "ok");
    Ok(stats)
}

fn print_report(config: &Config, stats: &IngestStats, status: &str) {
    println!("ingest {}", config.index.collection);
    println!("  files found: {}", stats.files_found);
    println!("  files loaded: {}", stats.files_loaded);
    println!("  files failed: {}", stats.files_failed);
    println!("  chunks created: {}", stats.chunks_created);
    println!("  items indexed: {}", stats.items_indexed);
    println!("{status}");
}
