//! # Citation Index Module
//!
//! ## Purpose
//! Exact-match retrieval path: extracts candidate statutory-section
//! identifiers from a query and finds the chunks whose text contains a
//! recognized citation surface form for any of them.
//!
//! ## Input/Output Specification
//! - **Input**: Query text, chunk corpus
//! - **Output**: Matching chunks in corpus order (match strength is not ranked;
//!   citation matches are equally authoritative)
//!
//! Matching is literal containment over a fixed surface-form list, so it can
//! under-match a citation formatted unexpectedly and over-match a page number
//! or unrelated numeral that coincides with a form like `12.`. The merge
//! step's prioritization and bound keep that tolerable.

use crate::chunking::ChunkCorpus;
use crate::Chunk;
use regex::Regex;

/// Candidate identifier pattern: one to three digits, optionally followed by a
/// single uppercase letter (compound sections like `498A`).
const SECTION_PATTERN: &str = r"\b(\d{1,3}[A-Z]?)\b";

/// A section identifier extracted from a query, with its literal citation
/// surface forms pre-lowered for containment against chunk matching text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCandidate {
    /// The identifier as written in the query (e.g. `378`, `498A`)
    pub id: String,
    forms: Vec<String>,
}

impl SectionCandidate {
    fn new(id: &str) -> Self {
        let lowered = id.to_lowercase();
        let forms = vec![
            format!("section {lowered}"),
            format!("sec. {lowered}"),
            format!("s. {lowered}"),
            format!("{lowered}."),
            format!("[{lowered}]"),
        ];
        Self {
            id: id.to_string(),
            forms,
        }
    }

    /// Whether the chunk contains any citation surface form for this section.
    pub fn matches(&self, chunk: &Chunk) -> bool {
        self.forms.iter().any(|form| chunk.lowercase.contains(form))
    }
}

/// Extracts section candidates and tests chunks against their surface forms.
///
/// The surface-form list is fixed; swapping in a smarter citation parser only
/// requires replacing this type.
pub struct CitationMatcher {
    section_pattern: Regex,
}

impl CitationMatcher {
    pub fn new() -> Self {
        Self {
            // Fixed pattern, compiled once per matcher
            section_pattern: Regex::new(SECTION_PATTERN).expect("section pattern compiles"),
        }
    }

    /// Extract candidate section identifiers from the query, first-occurrence
    /// order, duplicates removed.
    pub fn candidates(&self, query: &str) -> Vec<SectionCandidate> {
        let mut seen = std::collections::HashSet::new();
        self.section_pattern
            .find_iter(query)
            .map(|m| m.as_str())
            .filter(|id| seen.insert(id.to_string()))
            .map(SectionCandidate::new)
            .collect()
    }

    /// Find all chunks containing a recognized citation for any candidate in
    /// the query. Result order follows corpus order.
    pub fn find_by_citation<'a>(&self, query: &str, corpus: &'a ChunkCorpus) -> Vec<&'a Chunk> {
        let candidates = self.candidates(query);
        if candidates.is_empty() {
            return Vec::new();
        }

        corpus
            .chunks()
            .iter()
            .filter(|chunk| candidates.iter().any(|candidate| candidate.matches(chunk)))
            .collect()
    }
}

impl Default for CitationMatcher {
    fn default() -> Self {
        Self::new()
    }
}
