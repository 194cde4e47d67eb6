//! # Chunking Module
//!
//! ## Purpose
//! Splits the ordered page texts of the source document into an ordered
//! sequence of overlapping chunks, the retrieval unit for the rest of the
//! system.
//!
//! ## Input/Output Specification
//! - **Input**: Ordered `PageText` records, chunk size and overlap settings
//! - **Output**: A frozen `ChunkCorpus` in source document order
//! - **Guarantees**: Full character coverage, bounded chunk size, stable order
//!
//! ## Key Features
//! - Prioritized separator boundaries (paragraph, line, sentence, word)
//! - Configurable overlap so provisions split mid-sentence keep their context
//! - Page and character provenance on every chunk
//!
//! Sizes are measured in bytes over UTF-8 text; every cut falls on a character
//! boundary, so a chunk can fall short of `chunk_size` but never splits a
//! character.

use crate::config::ChunkingConfig;
use crate::errors::{QaError, Result};
use crate::{Chunk, ChunkProvenance, PageText};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Split boundaries in priority order: paragraph break, line break, sentence
/// end, word break.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Separator inserted between pages before splitting. A page break is treated
/// as a paragraph break, the highest-priority boundary.
const PAGE_JOIN: &str = "\n\n";

/// Splits page text into overlapping chunks under size constraints
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker, rejecting settings that could not terminate.
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(QaError::ValidationFailed {
                field: "chunking.chunk_size".to_string(),
                reason: "Chunk size must be greater than zero".to_string(),
            });
        }
        if config.overlap >= config.chunk_size {
            return Err(QaError::ValidationFailed {
                field: "chunking.overlap".to_string(),
                reason: format!(
                    "Overlap ({}) must be smaller than chunk size ({})",
                    config.overlap, config.chunk_size
                ),
            });
        }
        Ok(Self {
            chunk_size: config.chunk_size,
            overlap: config.overlap,
        })
    }

    /// Split pages into ordered, overlapping chunks.
    ///
    /// Pages are joined with a blank line first, so overlap carries context
    /// across page breaks. Every character of the joined text appears in at
    /// least one chunk, and chunk order equals source order.
    pub fn split(&self, pages: &[PageText]) -> Vec<Chunk> {
        let (joined, page_starts) = join_pages(pages);
        if joined.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < joined.len() {
            let end = self.chunk_end(&joined, start);

            let text = &joined[start..end];
            if !text.is_empty() {
                let provenance = ChunkProvenance {
                    pages: (
                        page_of(&page_starts, start),
                        page_of(&page_starts, end.saturating_sub(1)),
                    ),
                    chars: (start, end),
                };
                chunks.push(Chunk::new(text.to_string(), chunks.len(), provenance));
            }

            if end >= joined.len() {
                break;
            }

            // Step back by the overlap for the next chunk, but always advance.
            let next = floor_char_boundary(&joined, end.saturating_sub(self.overlap));
            start = if next > start { next } else { end };
        }

        chunks
    }

    /// Find where the chunk starting at `start` should end: the last
    /// occurrence of the earliest-priority separator inside the window, or a
    /// hard cut at `chunk_size` when the window contains none.
    fn chunk_end(&self, text: &str, start: usize) -> usize {
        let remaining = text.len() - start;
        if remaining <= self.chunk_size {
            return text.len();
        }

        let window_end = floor_char_boundary(text, start + self.chunk_size);
        let window = &text[start..window_end];

        for separator in SEPARATORS {
            if let Some(pos) = window.rfind(separator) {
                if pos > 0 {
                    return start + pos + separator.len();
                }
            }
        }

        // No separator in the window: an unsplittable span gets cut anyway.
        if window_end > start {
            window_end
        } else {
            ceil_char_boundary(text, start + 1)
        }
    }
}

/// Join page texts into one document string, recording where each page starts.
fn join_pages(pages: &[PageText]) -> (String, Vec<(usize, usize)>) {
    let mut joined = String::new();
    let mut page_starts = Vec::with_capacity(pages.len());

    for (position, page) in pages.iter().enumerate() {
        if position > 0 {
            joined.push_str(PAGE_JOIN);
        }
        page_starts.push((joined.len(), page.index));
        joined.push_str(&page.text);
    }

    (joined, page_starts)
}

/// Page index owning the given byte offset (the last page starting at or
/// before it).
fn page_of(page_starts: &[(usize, usize)], offset: usize) -> usize {
    let position = page_starts.partition_point(|(start, _)| *start <= offset);
    page_starts
        .get(position.saturating_sub(1))
        .map(|(_, index)| *index)
        .unwrap_or(0)
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// The frozen, ordered collection of all chunks derived from one document.
///
/// Built exactly once; concurrent queries read it without synchronization.
/// Re-indexing a changed document requires a process restart.
pub struct ChunkCorpus {
    chunks: Vec<Chunk>,
    build_id: Uuid,
    built_at: DateTime<Utc>,
    page_count: usize,
}

impl ChunkCorpus {
    /// Build the corpus from ordered pages. An empty document yields an empty
    /// corpus, which downstream retrieval treats as "no context", not an
    /// error.
    pub fn build(pages: &[PageText], chunker: &Chunker) -> Self {
        let chunks = chunker.split(pages);
        tracing::info!(
            "Built chunk corpus: {} chunk(s) from {} page(s)",
            chunks.len(),
            pages.len()
        );
        Self {
            chunks,
            build_id: Uuid::new_v4(),
            built_at: Utc::now(),
            page_count: pages.len(),
        }
    }

    /// Assemble a corpus from pre-built chunks, renumbering them in corpus
    /// order.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        let chunks = chunks
            .into_iter()
            .enumerate()
            .map(|(index, mut chunk)| {
                chunk.index = index;
                chunk
            })
            .collect();
        Self {
            chunks,
            build_id: Uuid::new_v4(),
            built_at: Utc::now(),
            page_count: 0,
        }
    }

    /// Corpus with no chunks, used when the document could not be loaded.
    pub fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            build_id: Uuid::new_v4(),
            built_at: Utc::now(),
            page_count: 0,
        }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn build_id(&self) -> Uuid {
        self.build_id
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, overlap: usize) -> Chunker {
        Chunker::new(&ChunkingConfig {
            chunk_size,
            overlap,
        })
        .unwrap()
    }

    fn page(index: usize, text: &str) -> PageText {
        PageText {
            index,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_small_text_is_a_single_chunk() {
        let chunks = chunker(1000, 100).split(&[page(0, "Section 1. Title and extent.")]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Section 1. Title and extent.");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_empty_input_yields_empty_corpus() {
        let chunks = chunker(1000, 100).split(&[]);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunks_never_exceed_chunk_size() {
        let text = "Whoever commits theft shall be punished. ".repeat(50);
        let chunks = chunker(200, 40).split(&[page(0, &text)]);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 200, "chunk of {} bytes", chunk.text.len());
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let text = format!("{}\n\n{}", "a".repeat(80), "b".repeat(80));
        let chunks = chunker(100, 10).split(&[page(0, &text)]);
        assert!(chunks[0].text.ends_with("\n\n"));
        assert!(chunks[0].text.starts_with('a'));
    }

    #[test]
    fn test_unsplittable_span_is_still_cut() {
        let text = "x".repeat(500);
        let chunks = chunker(100, 20).split(&[page(0, &text)]);
        assert!(chunks.len() >= 5);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 100);
        }
    }

    #[test]
    fn test_every_character_is_covered() {
        let text = "The Indian Penal Code. ".repeat(40);
        let chunks = chunker(150, 30).split(&[page(0, &text)]);

        assert_eq!(chunks.first().unwrap().provenance.chars.0, 0);
        assert_eq!(chunks.last().unwrap().provenance.chars.1, text.len());
        for window in chunks.windows(2) {
            let (_, prev_end) = window[0].provenance.chars;
            let (next_start, _) = window[1].provenance.chars;
            assert!(next_start <= prev_end, "gap between chunks");
        }
    }

    #[test]
    fn test_overlap_repeats_preceding_text() {
        let text = "word ".repeat(200);
        let chunks = chunker(100, 20).split(&[page(0, &text)]);
        assert!(chunks.len() > 1);

        for window in chunks.windows(2) {
            let (_, prev_end) = window[0].provenance.chars;
            let (next_start, _) = window[1].provenance.chars;
            // Either stepped back by the overlap, or the splitter had to
            // continue from the cut to keep advancing.
            assert!(prev_end - next_start <= 20);
        }
    }

    #[test]
    fn test_chunk_order_follows_document_order() {
        let text = "Clause. ".repeat(100);
        let chunks = chunker(80, 16).split(&[page(0, &text)]);
        for (position, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, position);
        }
        for window in chunks.windows(2) {
            assert!(window[0].provenance.chars.0 < window[1].provenance.chars.0);
        }
    }

    #[test]
    fn test_page_span_provenance() {
        let pages = [page(0, &"first page text. ".repeat(10)), page(1, &"second page text. ".repeat(10))];
        let chunks = chunker(400, 50).split(&pages);
        assert_eq!(chunks.first().unwrap().provenance.pages.0, 0);
        assert_eq!(chunks.last().unwrap().provenance.pages.1, 1);
    }

    #[test]
    fn test_lowercase_copy_tracks_text() {
        let chunks = chunker(1000, 100).split(&[page(0, "Section 378. Theft")]);
        assert_eq!(chunks[0].lowercase, "section 378. theft");
    }

    #[test]
    fn test_overlap_must_stay_below_chunk_size() {
        let result = Chunker::new(&ChunkingConfig {
            chunk_size: 100,
            overlap: 100,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_multibyte_text_cuts_on_char_boundaries() {
        let text = "धारा ३७८ चोरी। ".repeat(60);
        let chunks = chunker(120, 24).split(&[page(0, &text)]);
        for chunk in &chunks {
            // Would panic during slicing if a cut split a character; also
            // verify the text round-trips as valid UTF-8 content.
            assert!(!chunk.text.is_empty());
        }
    }
}
