//! # Embedding Relevance Module
//!
//! ## Purpose
//! Dense-vector variant of the relevance index: chunks are encoded once at
//! index build, the query is encoded per request with the same backend, and
//! chunks are ranked by cosine similarity.
//!
//! ## Input/Output Specification
//! - **Input**: Query text, chunk corpus, an `EmbeddingBackend` collaborator
//! - **Output**: At most `top_k` chunks, similarity-descending, corpus order
//!   on ties
//! - **Failure**: Backend errors propagate to the caller unchanged; the
//!   ranker itself does not retry

use crate::chunking::ChunkCorpus;
use crate::errors::Result;
use crate::Chunk;
use async_trait::async_trait;
use std::sync::Arc;

/// External encoder supplying fixed-length vectors.
///
/// Implementations must be deterministic: identical input text yields an
/// identical vector for the lifetime of the index.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Encode one text into a fixed-length vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Chunk vectors computed at build time, plus the backend used for queries.
pub struct EmbeddingIndex {
    backend: Arc<dyn EmbeddingBackend>,
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingIndex {
    /// Encode every chunk in the corpus. One-time, build-phase work; the
    /// resulting index is immutable.
    pub async fn build(backend: Arc<dyn EmbeddingBackend>, corpus: &ChunkCorpus) -> Result<Self> {
        let mut vectors = Vec::with_capacity(corpus.len());
        for chunk in corpus.chunks() {
            vectors.push(backend.embed(&chunk.text).await?);
        }
        tracing::info!("Encoded {} chunk vector(s)", vectors.len());
        Ok(Self { backend, vectors })
    }

    /// Rank the corpus by cosine similarity to the query embedding.
    pub async fn rank<'a>(
        &self,
        query: &str,
        corpus: &'a ChunkCorpus,
        top_k: usize,
    ) -> Result<Vec<&'a Chunk>> {
        if corpus.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.backend.embed(query).await?;

        let mut scored: Vec<(f32, usize)> = self
            .vectors
            .iter()
            .zip(corpus.chunks())
            .map(|(vector, chunk)| (cosine_similarity(&query_vector, vector), chunk.index))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, index)| &corpus.chunks()[index])
            .collect())
    }
}

/// Cosine similarity of two vectors; zero when either has no magnitude or the
/// dimensions disagree.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChunkProvenance;

    /// Deterministic toy encoder: letter-frequency histogram.
    struct LetterFrequencyBackend;

    #[async_trait]
    impl EmbeddingBackend for LetterFrequencyBackend {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut histogram = vec![0.0f32; 26];
            for c in text.to_lowercase().chars() {
                if c.is_ascii_lowercase() {
                    histogram[(c as u8 - b'a') as usize] += 1.0;
                }
            }
            Ok(histogram)
        }
    }

    fn corpus_of(texts: &[&str]) -> ChunkCorpus {
        ChunkCorpus::from_chunks(
            texts
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
                .collect(),
        )
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_rank_prefers_similar_chunks() {
        let backend = Arc::new(LetterFrequencyBackend);
        let corpus = corpus_of(&["zzz qqq xxx", "theft of movable property", "mmm www"]);
        let index = EmbeddingIndex::build(backend, &corpus).await.unwrap();

        let ranked = index.rank("theft property", &corpus, 1).await.unwrap();
        assert_eq!(ranked[0].index, 1);
    }

    #[tokio::test]
    async fn test_rank_bounded_by_top_k() {
        let backend = Arc::new(LetterFrequencyBackend);
        let corpus = corpus_of(&["aaa", "aab", "aba", "baa"]);
        let index = EmbeddingIndex::build(backend, &corpus).await.unwrap();

        let ranked = index.rank("aaa", &corpus, 2).await.unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[tokio::test]
    async fn test_identical_chunks_tie_in_corpus_order() {
        let backend = Arc::new(LetterFrequencyBackend);
        let corpus = corpus_of(&["theft", "theft", "arson"]);
        let index = EmbeddingIndex::build(backend, &corpus).await.unwrap();

        let ranked = index.rank("theft", &corpus, 3).await.unwrap();
        let indices: Vec<usize> = ranked.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_empty_corpus_ranks_empty() {
        let backend = Arc::new(LetterFrequencyBackend);
        let corpus = ChunkCorpus::empty();
        let index = EmbeddingIndex::build(backend, &corpus).await.unwrap();
        assert!(index.rank("anything", &corpus, 5).await.unwrap().is_empty());
    }
}
