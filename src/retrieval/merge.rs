//! # Merge Module
//!
//! ## Purpose
//! Combines citation-index and relevance-index results into one bounded,
//! order-stable, deduplicated context list with citation hits prioritized.

use crate::Chunk;
use std::collections::HashSet;

/// Merge the two retrieval signals.
///
/// All citation hits come first in their own order, followed by relevance
/// hits not already present (dedup by chunk index, the chunk's identity).
/// Truncation to `max_results` happens strictly after deduplication, so
/// citation hits are never starved by an early cut. Same inputs always yield
/// the same output sequence.
pub fn merge(
    citation_hits: Vec<&Chunk>,
    relevance_hits: Vec<&Chunk>,
    max_results: usize,
) -> Vec<Chunk> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for chunk in citation_hits.into_iter().chain(relevance_hits) {
        if seen.insert(chunk.index) {
            merged.push(chunk.clone());
        }
    }

    merged.truncate(max_results);
    merged
}
