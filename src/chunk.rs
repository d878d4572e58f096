//! Sliding-window text chunker with separator-aware breaks.
//!
//! Splits [`TextUnit`] content into overlapping windows of at most
//! `chunk_size` characters, with `chunk_overlap` characters shared between
//! consecutive chunks of the same parent. Window ends prefer natural
//! boundaries, tried in order: paragraph (`\n\n`), line (`\n`), sentence
//! (`. `), word (` `), then a hard character split. Chunks never cross
//! unit boundaries.
//!
//! Each chunk records the character offset where it starts in its parent,
//! so the exact fragment can be located again. Same input and parameters
//! always yield the same chunk sequence.

use crate::models::{Chunk, TextUnit, UNKNOWN_SOURCE};

/// Break-point candidates, most preferred first.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Split raw text into `(start_offset, content)` windows.
///
/// Offsets are in characters, not bytes, so multi-byte text is safe to
/// slice at any returned boundary.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<(usize, String)> {
    // The overlap must stay below the window size so every step advances.
    let chunk_overlap = chunk_overlap.min(chunk_size.saturating_sub(1));

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    if len == 0 {
        return Vec::new();
    }
    if len <= chunk_size {
        return vec![(0, text.to_string())];
    }

    let mut pieces = Vec::new();
    let mut pos = 0usize;

    while pos < len {
        let hard_end = (pos + chunk_size).min(len);

        let end = if hard_end == len {
            len
        } else {
            find_break(&chars, pos, hard_end, pos + chunk_overlap).unwrap_or(hard_end)
        };

        pieces.push((pos, chars[pos..end].iter().collect::<String>()));

        if end == len {
            break;
        }
        pos = end - chunk_overlap;
    }

    pieces
}

/// Find the most natural break position in `[pos, hard_end]`.
///
/// Returns the index just past the last occurrence of the first separator
/// that matches, constrained to land after `min_end` (so the next window
/// starts beyond the current one).
fn find_break(chars: &[char], pos: usize, hard_end: usize, min_end: usize) -> Option<usize> {
    for sep in SEPARATORS {
        let sep_chars: Vec<char> = sep.chars().collect();
        let sep_len = sep_chars.len();
        if hard_end - pos < sep_len {
            continue;
        }

        let mut best: Option<usize> = None;
        for start in pos..=(hard_end - sep_len) {
            if chars[start..start + sep_len] == sep_chars[..] {
                let break_pos = start + sep_len;
                if break_pos > min_end && break_pos <= hard_end {
                    best = Some(break_pos);
                }
            }
        }

        if best.is_some() {
            return best;
        }
    }
    None
}

/// Chunk a single unit, inheriting its provenance.
///
/// Whitespace-only units produce no chunks. A unit with a blank source
/// field gets the placeholder source rather than failing.
pub fn chunk_unit(unit: &TextUnit, chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    if unit.content.trim().is_empty() {
        return Vec::new();
    }

    let source = if unit.source.trim().is_empty() {
        UNKNOWN_SOURCE.to_string()
    } else {
        unit.source.clone()
    };

    split_text(&unit.content, chunk_size, chunk_overlap)
        .into_iter()
        .map(|(start_offset, content)| Chunk {
            content,
            source: source.clone(),
            page: unit.page,
            file_type: unit.file_type,
            start_offset,
        })
        .collect()
}

/// Chunk a batch of units in order.
pub fn chunk_units(units: &[TextUnit], chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    units
        .iter()
        .flat_map(|unit| chunk_unit(unit, chunk_size, chunk_overlap))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileType;

    fn unit(content: &str, source: &str) -> TextUnit {
        TextUnit {
            content: content.to_string(),
            source: source.to_string(),
            page: None,
            file_type: FileType::Txt,
        }
    }

    #[test]
    fn test_small_text_single_chunk() {
        let pieces = split_text("Hello, world!", 1000, 200);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0], (0, "Hello, world!".to_string()));
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(split_text("", 1000, 200).is_empty());
        assert!(chunk_unit(&unit("   \n\t ", "a.txt"), 1000, 200).is_empty());
    }

    #[test]
    fn test_hard_cap_respected() {
        let text = "x".repeat(5000);
        for (_, piece) in split_text(&text, 1000, 200) {
            assert!(piece.chars().count() <= 1000);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma. ".repeat(100);
        let a = split_text(&text, 120, 30);
        let b = split_text(&text, 120, 30);
        assert_eq!(a, b);
    }

    #[test]
    fn test_overlap_invariant() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let overlap = 50;
        let pieces = split_text(&text, 200, overlap);
        assert!(pieces.len() > 1);

        for pair in pieces.windows(2) {
            let prev: Vec<char> = pair[0].1.chars().collect();
            let next: Vec<char> = pair[1].1.chars().collect();
            let tail: Vec<char> = prev[prev.len() - overlap..].to_vec();
            let head: Vec<char> = next[..overlap].to_vec();
            assert_eq!(tail, head, "trailing overlap must equal leading overlap");
        }
    }

    #[test]
    fn test_offsets_locate_content() {
        let text = "Paragraph one is here.\n\nParagraph two follows it.\n\n".repeat(20);
        let chars: Vec<char> = text.chars().collect();
        for (offset, piece) in split_text(&text, 150, 40) {
            let piece_chars: Vec<char> = piece.chars().collect();
            assert_eq!(&chars[offset..offset + piece_chars.len()], &piece_chars[..]);
        }
    }

    #[test]
    fn test_prefers_paragraph_boundary() {
        // Two paragraphs that fit in one window only if split arbitrarily.
        let text = format!("{}\n\n{}", "a".repeat(80), "b".repeat(80));
        let pieces = split_text(&text, 100, 10);
        assert!(pieces.len() > 1);
        assert!(
            pieces[0].1.ends_with("\n\n"),
            "first window should break at the paragraph boundary, got {:?}",
            pieces[0].1
        );
    }

    #[test]
    fn test_multibyte_text_is_safe() {
        let text = "héllo wörld. ".repeat(50);
        let pieces = split_text(&text, 64, 16);
        for (_, piece) in &pieces {
            assert!(piece.chars().count() <= 64);
        }
    }

    #[test]
    fn test_chunks_inherit_provenance() {
        let u = TextUnit {
            content: "Some page text that is long enough to matter.".to_string(),
            source: "report.pdf".to_string(),
            page: Some(4),
            file_type: FileType::Pdf,
        };
        let chunks = chunk_unit(&u, 1000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "report.pdf");
        assert_eq!(chunks[0].page, Some(4));
        assert_eq!(chunks[0].file_type, FileType::Pdf);
        assert_eq!(chunks[0].start_offset, 0);
    }

    #[test]
    fn test_blank_source_backfilled() {
        let chunks = chunk_unit(&unit("content without provenance", "  "), 1000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, UNKNOWN_SOURCE);
    }

    #[test]
    fn test_chunks_never_cross_unit_boundaries() {
        let units = vec![
            unit(&"first file sentence. ".repeat(30), "a.txt"),
            unit(&"second file sentence. ".repeat(30), "b.txt"),
        ];
        let chunks = chunk_units(&units, 200, 50);
        assert!(chunks.iter().any(|c| c.source == "a.txt"));
        assert!(chunks.iter().any(|c| c.source == "b.txt"));
        for c in &chunks {
            let parent = units.iter().find(|u| u.source == c.source).unwrap();
            let parent_chars: Vec<char> = parent.content.chars().collect();
            let piece: Vec<char> = c.content.chars().collect();
            assert_eq!(
                &parent_chars[c.start_offset..c.start_offset + piece.len()],
                &piece[..],
                "chunk content must come from its own parent"
            );
        }
    }
}
