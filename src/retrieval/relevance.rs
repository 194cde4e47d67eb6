//! # Relevance Index Module
//!
//! ## Purpose
//! Fuzzy-match retrieval path: scores every chunk against term and keyword
//! overlap with the query and returns the top-scoring chunks.
//!
//! ## Input/Output Specification
//! - **Input**: Query text, chunk corpus, shared citation matcher
//! - **Output**: At most `top_k` chunks, score-descending, corpus order on ties
//! - **Fallback**: First chunks in corpus order when nothing scores above zero
//!
//! ## Key Features
//! - Named scoring weights auditable independent of the matching logic
//! - Citation surface-form hits reinforce the exact-match path
//! - Fixed legal-vocabulary boost for terms shared by query and chunk
//! - Corpus scan parallelized per query

use super::citation::{CitationMatcher, SectionCandidate};
use crate::chunking::ChunkCorpus;
use crate::Chunk;
use rayon::prelude::*;
use regex::Regex;

/// Query word tokens: three or more word characters
const TOKEN_PATTERN: &str = r"\b\w{3,}\b";

/// Fixed legal vocabulary boosted when present in both query and chunk
const DOMAIN_TERMS: [&str; 6] = [
    "punishment",
    "offence",
    "imprisonment",
    "fine",
    "whoever",
    "shall be",
];

/// Scoring weights for the lexical ranker.
///
/// Kept in one place so weight changes are auditable and testable without
/// touching the matching logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringPolicy {
    /// Added once per candidate section whose citation surface form appears
    /// in the chunk
    pub citation_hit: i64,
    /// Multiplied by the occurrence count of each query token in the chunk
    pub token_occurrence: i64,
    /// Added once per domain term present in both query and chunk
    pub domain_term: i64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            citation_hit: 100,
            token_occurrence: 2,
            domain_term: 10,
        }
    }
}

/// The query, decomposed once per request for scoring against every chunk.
#[derive(Debug, Clone)]
pub struct QueryTerms {
    /// Candidate section identifiers with their surface forms
    pub candidates: Vec<SectionCandidate>,
    /// Lower-cased word tokens of length >= 3, deduplicated
    pub tokens: Vec<String>,
    /// Domain terms present in the query
    pub domain_terms: Vec<&'static str>,
}

/// Lexical relevance ranker: term/keyword overlap, no external dependency.
pub struct LexicalRanker {
    token_pattern: Regex,
    policy: ScoringPolicy,
}

impl LexicalRanker {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            token_pattern: Regex::new(TOKEN_PATTERN).expect("token pattern compiles"),
            policy,
        }
    }

    /// Decompose a query into the terms the scorer consumes.
    pub fn parse_terms(&self, query: &str, matcher: &CitationMatcher) -> QueryTerms {
        let lowered = query.to_lowercase();

        let mut seen = std::collections::HashSet::new();
        let tokens = self
            .token_pattern
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .filter(|token| seen.insert(token.clone()))
            .collect();

        let domain_terms = DOMAIN_TERMS
            .iter()
            .copied()
            .filter(|term| lowered.contains(term))
            .collect();

        QueryTerms {
            candidates: matcher.candidates(query),
            tokens,
            domain_terms,
        }
    }

    /// Score one chunk against the decomposed query.
    pub fn score_chunk(&self, chunk: &Chunk, terms: &QueryTerms) -> i64 {
        let mut score = 0;

        for candidate in &terms.candidates {
            if candidate.matches(chunk) {
                score += self.policy.citation_hit;
            }
        }

        for token in &terms.tokens {
            let occurrences = chunk.lowercase.matches(token.as_str()).count();
            score += self.policy.token_occurrence * occurrences as i64;
        }

        for term in &terms.domain_terms {
            if chunk.lowercase.contains(term) {
                score += self.policy.domain_term;
            }
        }

        score
    }

    /// Rank the corpus against the query: score-descending, earlier chunk on
    /// ties, chunks scoring zero dropped, at most `top_k` returned.
    ///
    /// When no chunk scores above zero, the first `fallback_chunks` chunks in
    /// corpus order are returned instead, so a non-empty corpus always yields
    /// context.
    pub fn rank<'a>(
        &self,
        query: &str,
        corpus: &'a ChunkCorpus,
        matcher: &CitationMatcher,
        top_k: usize,
        fallback_chunks: usize,
    ) -> Vec<&'a Chunk> {
        if corpus.is_empty() {
            return Vec::new();
        }

        let terms = self.parse_terms(query, matcher);

        let mut scored: Vec<(i64, usize)> = corpus
            .chunks()
            .par_iter()
            .map(|chunk| (self.score_chunk(chunk, &terms), chunk.index))
            .collect();

        scored.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let top: Vec<&Chunk> = scored
            .iter()
            .take(top_k)
            .filter(|(score, _)| *score > 0)
            .map(|(_, index)| &corpus.chunks()[*index])
            .collect();

        if !top.is_empty() {
            return top;
        }

        corpus
            .chunks()
            .iter()
            .take(fallback_chunks.min(corpus.len()))
            .collect()
    }
}

impl Default for LexicalRanker {
    fn default() -> Self {
        Self::new(ScoringPolicy::default())
    }
}
