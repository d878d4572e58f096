//! Document loader for local folders.
//!
//! Scans a folder (non-recursively) for `.pdf`, `.txt`, and `.md` files and
//! turns them into [`TextUnit`]s with provenance metadata. PDFs contribute
//! one unit per page; text and markdown files contribute one unit each.
//! Pages and files that are empty after extraction are dropped.
//!
//! A file that fails to parse is recorded and skipped; an unreadable file
//! never aborts the batch. An empty folder is not an error, the caller
//! decides whether that is fatal.

use std::path::{Path, PathBuf};

use crate::error::{AssistantError, Result};
use crate::models::{FileType, TextUnit};

/// A file the loader had to skip, with the reason.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything one loader pass produced.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub units: Vec<TextUnit>,
    pub failures: Vec<LoadFailure>,
    /// Supported files seen in the folder.
    pub files_found: usize,
    /// Files that produced at least one unit.
    pub files_loaded: usize,
}

/// Load every supported file in `folder` into text units.
pub fn load_dir(folder: &Path) -> Result<LoadOutcome> {
    if !folder.is_dir() {
        return Err(AssistantError::Configuration(format!(
            "document folder does not exist: {}",
            folder.display()
        )));
    }

    // Collect supported files first, sorted by name for deterministic order.
    let mut files: Vec<(PathBuf, FileType)> = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_type) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| FileType::from_extension(&e.to_ascii_lowercase()))
        else {
            continue;
        };
        files.push((path, file_type));
    }
    files.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));

    let mut outcome = LoadOutcome {
        files_found: files.len(),
        ..Default::default()
    };

    for (path, file_type) in files {
        let before = outcome.units.len();
        let result = match file_type {
            FileType::Pdf => load_pdf(&path, &mut outcome.units),
            FileType::Txt | FileType::Md => load_text(&path, file_type, &mut outcome.units),
        };

        match result {
            Ok(()) => {
                if outcome.units.len() > before {
                    outcome.files_loaded += 1;
                } else {
                    tracing::debug!("no text content in {}", path.display());
                }
            }
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
                outcome.failures.push(LoadFailure {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}

/// Extract a PDF page by page; whitespace-only pages produce no unit.
fn load_pdf(path: &Path, units: &mut Vec<TextUnit>) -> Result<()> {
    let bytes = std::fs::read(path).map_err(|e| load_err(path, e))?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| load_err(path, e))?;

    let source = file_name(path);
    for (page_idx, text) in pages.iter().enumerate() {
        if text.trim().is_empty() {
            continue;
        }
        units.push(TextUnit {
            content: text.clone(),
            source: source.clone(),
            page: Some(page_idx as i64 + 1),
            file_type: FileType::Pdf,
        });
    }
    Ok(())
}

/// Read a whole txt/md file as UTF-8; whitespace-only files produce no unit.
fn load_text(path: &Path, file_type: FileType, units: &mut Vec<TextUnit>) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(|e| load_err(path, e))?;
    if content.trim().is_empty() {
        return Ok(());
    }
    units.push(TextUnit {
        content,
        source: file_name(path),
        page: None,
        file_type,
    });
    Ok(())
}

fn load_err(path: &Path, e: impl std::fmt::Display) -> AssistantError {
    AssistantError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
