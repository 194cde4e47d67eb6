//! # Context Assembly Module
//!
//! ## Purpose
//! Joins merged chunk texts into the single delimited block handed to the
//! language-model collaborator.

use crate::Chunk;

/// Delimiter between chunks: a blank line around a visual rule, so the
/// language model can tell chunk boundaries apart.
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Join chunk texts, original casing preserved, into one context block.
///
/// An empty chunk sequence yields an empty string; whether that is an error
/// is the caller's decision.
pub fn assemble(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}
