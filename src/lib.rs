//! # Statute Question Answering Engine
//!
//! ## Overview
//! This library implements a retrieval-augmented question-answering service for
//! the Indian Penal Code 1860. It retrieves the statutory passages relevant to
//! a natural-language question and forwards them, with the question, to a
//! language-model collaborator for synthesis.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `document`: Loading boundary for pre-extracted page text
//! - `chunking`: Splitting page text into an overlapping chunk corpus
//! - `retrieval`: Citation matching, relevance ranking, merging, context assembly
//! - `llm`: Language-model collaborator client and prompt template
//! - `api`: REST API endpoints
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: A statutory document (ordered page texts), questions (text)
//! - **Output**: Synthesized answers grounded in retrieved statutory passages
//! - **Performance**: Pure in-memory retrieval, deterministic results
//!
//! ## Usage
//! ```rust,no_run
//! use statute_qa::{Config, RetrievalIndex};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let pages = statute_qa::document::load_pages(&config.document).await?;
//!     let index = RetrievalIndex::build(pages, &config).await?;
//!     let chunks = index.retrieve("punishment for theft under section 378").await?;
//!     println!("Retrieved {} chunks", chunks.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod errors;
pub mod document;
pub mod chunking;
pub mod retrieval;
pub mod llm;
pub mod api;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{QaError, Result};
pub use retrieval::{RetrievalIndex, RetrievalStats};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One page of the source document, as produced by the external text extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// Zero-based page index in the source document
    pub index: usize,
    /// Page content, NFC-normalized with Unix line endings
    pub text: String,
}

/// Where a chunk was cut from, for traceability.
///
/// Not consulted by retrieval itself; `Chunk::index` is the identity used for
/// ordering and deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkProvenance {
    /// First and last page the chunk overlaps (inclusive)
    pub pages: (usize, usize),
    /// Character span in the joined document text (half-open)
    pub chars: (usize, usize),
}

/// A bounded, ordered span of document text used as the retrieval unit.
///
/// Chunks are produced once at index build and never mutated afterwards; the
/// corpus is shared read-only across concurrent queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Literal content with original casing, used for display and context assembly
    pub text: String,
    /// Lower-cased copy kept for matching
    pub lowercase: String,
    /// Position in the chunk corpus, stable for the process lifetime
    pub index: usize,
    /// Page and character span this chunk was cut from
    pub provenance: ChunkProvenance,
}

impl Chunk {
    /// Create a chunk from its literal text, deriving the matching copy.
    pub fn new(text: String, index: usize, provenance: ChunkProvenance) -> Self {
        let lowercase = text.to_lowercase();
        Self {
            text,
            lowercase,
            index,
            provenance,
        }
    }
}

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub index: Arc<retrieval::RetrievalIndex>,
    pub llm: Option<Arc<dyn llm::AnswerBackend>>,
}
