//! # Document Loading Module
//!
//! ## Purpose
//! Boundary with the external text extractor. PDF parsing is not performed
//! here; the service consumes an already-extracted text rendition of the
//! statute, one form feed (`\x0c`) per page break, and turns it into an
//! ordered sequence of page records.
//!
//! ## Input/Output Specification
//! - **Input**: Path to a UTF-8 text file with form-feed page delimiters
//! - **Output**: Ordered `PageText` records, NFC-normalized, Unix line endings
//! - **Failure**: Missing or unreadable files surface as `DocumentLoad`

use crate::config::DocumentConfig;
use crate::errors::{QaError, Result};
use crate::PageText;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Page delimiter emitted by conventional text extractors
const PAGE_DELIMITER: char = '\x0c';

/// Source of ordered page texts for index construction
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load all pages in document order
    async fn load(&self) -> Result<Vec<PageText>>;
}

/// Reads pre-extracted page text from a local file
pub struct TextFileSource {
    path: PathBuf,
}

impl TextFileSource {
    /// Create a source for the given text file
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl DocumentSource for TextFileSource {
    async fn load(&self) -> Result<Vec<PageText>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| QaError::DocumentLoad {
                path: self.path.display().to_string(),
                details: e.to_string(),
            })?;

        let pages = split_pages(&raw);

        let empty_pages = pages.iter().filter(|p| p.text.trim().is_empty()).count();
        if empty_pages > 0 {
            tracing::warn!(
                "Document {:?} contains {} empty page(s)",
                self.path,
                empty_pages
            );
        }

        tracing::info!("Loaded {} page(s) from {:?}", pages.len(), self.path);
        Ok(pages)
    }
}

/// Load pages from the configured document path.
pub async fn load_pages(config: &DocumentConfig) -> Result<Vec<PageText>> {
    TextFileSource::new(&config.path).load().await
}

/// Split raw extractor output into ordered page records.
///
/// Extractors terminate every page with a form feed, so a trailing empty
/// fragment is dropped rather than indexed as a phantom page.
fn split_pages(raw: &str) -> Vec<PageText> {
    let mut fragments: Vec<&str> = raw.split(PAGE_DELIMITER).collect();
    if fragments.len() > 1 && fragments.last().is_some_and(|f| f.trim().is_empty()) {
        fragments.pop();
    }

    fragments
        .into_iter()
        .enumerate()
        .map(|(index, fragment)| PageText {
            index,
            text: normalize_page_text(fragment),
        })
        .collect()
}

/// Fold line endings to `\n` and apply Unicode NFC normalization.
fn normalize_page_text(raw: &str) -> String {
    let unix = raw.replace("\r\n", "\n").replace('\r', "\n");
    unix.nfc().collect()
}
