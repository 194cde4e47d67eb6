//! # Retrieval Module
//!
//! ## Purpose
//! The retrieval core: builds the frozen chunk corpus once, consults the
//! exact-match citation path and the fuzzy relevance path per query, and
//! merges both signals into a bounded, priority-ordered context set.
//!
//! ## Input/Output Specification
//! - **Input**: Ordered page texts at build time; query strings at request time
//! - **Output**: Ordered, deduplicated chunk sequences for context assembly
//! - **Concurrency**: The index is immutable after build; concurrent queries
//!   read it without synchronization
//!
//! ## Architecture
//! - `citation`: Exact statutory-citation matching
//! - `relevance`: Lexical keyword ranking (and the embedding variant)
//! - `embedding`: Dense-vector ranking behind an `EmbeddingBackend` seam
//! - `merge`: Citation-first combination of the two signals
//! - `context`: Final context-block assembly

pub mod citation;
pub mod context;
pub mod embedding;
pub mod merge;
pub mod relevance;

pub use citation::{CitationMatcher, SectionCandidate};
pub use context::{assemble, CONTEXT_DELIMITER};
pub use embedding::{EmbeddingBackend, EmbeddingIndex};
pub use merge::merge;
pub use relevance::{LexicalRanker, ScoringPolicy};

use crate::chunking::{ChunkCorpus, Chunker};
use crate::config::{Config, RelevanceStrategy, RetrievalConfig};
use crate::errors::{invalid_query, QaError, Result};
use crate::utils::Timer;
use crate::{Chunk, PageText};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// The relevance strategy actually wired into an index
enum RelevanceIndex {
    Lexical(LexicalRanker),
    Embedding(EmbeddingIndex),
}

/// Immutable retrieval index: chunk corpus plus both retrieval paths.
///
/// Constructed exactly once, in a single observable step, before any query is
/// served; request handlers share it by reference. There is no hidden
/// module-level state and no locking on the read path.
pub struct RetrievalIndex {
    corpus: ChunkCorpus,
    matcher: CitationMatcher,
    relevance: RelevanceIndex,
    settings: RetrievalConfig,
}

impl std::fmt::Debug for RetrievalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalIndex").finish_non_exhaustive()
    }
}

/// Snapshot of index state for status and stats endpoints
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalStats {
    pub chunks: usize,
    pub pages: usize,
    pub build_id: Uuid,
    pub built_at: DateTime<Utc>,
    pub strategy: RelevanceStrategy,
    pub top_k: usize,
    pub max_context_chunks: usize,
    pub ready: bool,
}

impl RetrievalIndex {
    /// Build the index from ordered pages with the configured lexical
    /// strategy.
    ///
    /// This is the single writer of retrieval state; callers must not serve
    /// queries until it returns.
    pub async fn build(pages: Vec<PageText>, config: &Config) -> Result<Self> {
        if config.retrieval.strategy == RelevanceStrategy::Embedding {
            return Err(QaError::Config {
                message: "Embedding strategy requires an embedding backend; \
                          use RetrievalIndex::build_with_backend"
                    .to_string(),
            });
        }

        let timer = Timer::new("index_build");
        let chunker = Chunker::new(&config.chunking)?;
        let corpus = ChunkCorpus::build(&pages, &chunker);

        let index = Self {
            corpus,
            matcher: CitationMatcher::new(),
            relevance: RelevanceIndex::Lexical(LexicalRanker::default()),
            settings: config.retrieval.clone(),
        };

        tracing::info!(
            "Retrieval index ready: {} chunk(s), build {} in {}ms",
            index.corpus.len(),
            index.corpus.build_id(),
            timer.stop()
        );
        Ok(index)
    }

    /// Build the index with the embedding strategy, encoding every chunk
    /// through the supplied backend.
    pub async fn build_with_backend(
        pages: Vec<PageText>,
        config: &Config,
        backend: Arc<dyn EmbeddingBackend>,
    ) -> Result<Self> {
        let timer = Timer::new("index_build");
        let chunker = Chunker::new(&config.chunking)?;
        let corpus = ChunkCorpus::build(&pages, &chunker);
        let embedding = EmbeddingIndex::build(backend, &corpus).await?;

        let index = Self {
            corpus,
            matcher: CitationMatcher::new(),
            relevance: RelevanceIndex::Embedding(embedding),
            settings: config.retrieval.clone(),
        };

        tracing::info!(
            "Retrieval index ready (embedding): {} chunk(s), build {} in {}ms",
            index.corpus.len(),
            index.corpus.build_id(),
            timer.stop()
        );
        Ok(index)
    }

    /// Wrap an already-built corpus with the lexical strategy. Also the
    /// degraded path when the document could not be loaded at all.
    pub fn from_corpus(corpus: ChunkCorpus, settings: RetrievalConfig) -> Self {
        Self {
            corpus,
            matcher: CitationMatcher::new(),
            relevance: RelevanceIndex::Lexical(LexicalRanker::default()),
            settings,
        }
    }

    /// Whether the index holds any retrievable content.
    pub fn ready(&self) -> bool {
        !self.corpus.is_empty()
    }

    pub fn corpus(&self) -> &ChunkCorpus {
        &self.corpus
    }

    /// The caller-facing retrieval entry point: citation path, relevance
    /// path, citation-first merge.
    ///
    /// An empty or whitespace query is rejected; an empty corpus degrades to
    /// an empty result, leaving the "is that an error" decision to the
    /// serving layer. For a non-empty corpus the result is never empty.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(invalid_query(query, "query must not be empty"));
        }
        if query.chars().count() > self.settings.max_query_chars {
            return Err(invalid_query(
                query,
                format!(
                    "query exceeds {} characters",
                    self.settings.max_query_chars
                ),
            ));
        }

        if self.corpus.is_empty() {
            tracing::debug!("Retrieval on empty corpus, returning no context");
            return Ok(Vec::new());
        }

        let citation_hits = self.matcher.find_by_citation(query, &self.corpus);
        let citation_count = citation_hits.len();
        let relevance_hits = match &self.relevance {
            RelevanceIndex::Lexical(ranker) => ranker.rank(
                query,
                &self.corpus,
                &self.matcher,
                self.settings.top_k,
                self.settings.fallback_chunks,
            ),
            RelevanceIndex::Embedding(index) => {
                index
                    .rank(query, &self.corpus, self.settings.top_k)
                    .await?
            }
        };

        let merged = merge(
            citation_hits,
            relevance_hits,
            self.settings.max_context_chunks,
        );

        tracing::debug!(
            "Retrieved {} chunk(s) ({} citation hit(s)) for query '{}'",
            merged.len(),
            citation_count,
            crate::utils::TextUtils::truncate(query, 60)
        );

        Ok(merged)
    }

    /// Snapshot for status endpoints.
    pub fn stats(&self) -> RetrievalStats {
        RetrievalStats {
            chunks: self.corpus.len(),
            pages: self.corpus.page_count(),
            build_id: self.corpus.build_id(),
            built_at: self.corpus.built_at(),
            strategy: self.settings.strategy,
            top_k: self.settings.top_k,
            max_context_chunks: self.settings.max_context_chunks,
            ready: self.ready(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChunkProvenance;

    fn settings() -> RetrievalConfig {
        RetrievalConfig {
            strategy: RelevanceStrategy::Lexical,
            top_k: 8,
            max_context_chunks: 10,
            fallback_chunks: 5,
            max_query_chars: 1000,
        }
    }

    fn index_of(texts: &[&str]) -> RetrievalIndex {
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(index, text)| {
                Chunk::new(
                    text.to_string(),
                    index,
                    ChunkProvenance {
                        pages: (0, 0),
                        chars: (0, text.len()),
                    },
                )
            })
            .collect();
        RetrievalIndex::from_corpus(ChunkCorpus::from_chunks(chunks), settings())
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let index = index_of(&["Section 378. Theft"]);
        let err = index.retrieve("").await.unwrap_err();
        assert_eq!(err.category(), "query");
    }

    #[tokio::test]
    async fn test_whitespace_query_is_rejected() {
        let index = index_of(&["Section 378. Theft"]);
        assert!(index.retrieve("   \n ").await.is_err());
    }

    #[tokio::test]
    async fn test_over_long_query_is_rejected() {
        let index = index_of(&["Section 378. Theft"]);
        let query = "theft ".repeat(400);
        assert!(index.retrieve(&query).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_corpus_degrades_to_empty_result() {
        let index = RetrievalIndex::from_corpus(ChunkCorpus::empty(), settings());
        assert!(!index.ready());
        let chunks = index.retrieve("section 378").await.unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_citation_chunk_ranked_ahead_of_keyword_chunks() {
        let index = index_of(&[
            "the general punishment provisions apply to every offence",
            "Section 378. Theft. Whoever, intending to take dishonestly",
            "punishment of abetment is the same",
        ]);

        let chunks = index
            .retrieve("What is the punishment for theft under section 378?")
            .await
            .unwrap();
        assert_eq!(chunks[0].index, 1);
    }

    #[tokio::test]
    async fn test_non_empty_corpus_always_yields_context() {
        let index = index_of(&["alpha", "beta", "gamma"]);
        let chunks = index.retrieve("completely unrelated words").await.unwrap();
        assert_eq!(chunks.len(), 3);
    }

    #[tokio::test]
    async fn test_retrieve_is_deterministic() {
        let index = index_of(&[
            "Section 302. Punishment for murder",
            "Section 378. Theft",
            "whoever commits theft shall be punished",
        ]);
        let first: Vec<usize> = index
            .retrieve("theft under section 378")
            .await
            .unwrap()
            .iter()
            .map(|c| c.index)
            .collect();
        let second: Vec<usize> = index
            .retrieve("theft under section 378")
            .await
            .unwrap()
            .iter()
            .map(|c| c.index)
            .collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_result_bounded_by_max_context_chunks() {
        let texts: Vec<String> = (0..30).map(|i| format!("theft clause {i}")).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let index = index_of(&refs);

        let chunks = index.retrieve("theft").await.unwrap();
        assert!(chunks.len() <= 10);
    }
}
