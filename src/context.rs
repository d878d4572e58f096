//! Context formatter: renders retrieved chunks into a prompt-ready string.
//!
//! Deterministic: the same chunks in the same order always produce the same
//! context block. Downstream prompting never sees an empty context section;
//! an empty input yields a fixed sentinel instead.

use crate::models::Chunk;

/// Returned when no chunks were retrieved, so the synthesizer prompt always
/// has a context section to point at.
pub const NO_CONTEXT_SENTINEL: &str = "No context documents found.";

/// Cap on how much of a chunk makes it into the prompt.
const MAX_SNIPPET_CHARS: usize = 1500;

/// Render chunks, in the given order, as numbered source blocks.
///
/// Each block is a header naming the file and page, up to 1500 characters
/// of chunk content, and a separator line.
pub fn format_context(chunks: &[Chunk]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT_SENTINEL.to_string();
    }

    let mut parts = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let page = chunk
            .page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let snippet = truncate_chars(&chunk.content, MAX_SNIPPET_CHARS);
        parts.push(format!(
            "Source {} (File: {}, Page: {}):\n{}\n---\n",
            i + 1,
            chunk.source,
            page,
            snippet
        ));
    }

    parts.join("\n")
}

/// Truncate at a character boundary; never splits a multi-byte character.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
