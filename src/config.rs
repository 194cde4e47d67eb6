//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the question-answering service,
//! supporting TOML files and environment variable overrides with validation
//! and type-safe access to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables, CLI arguments
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation, dependency verification
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Command line arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration files
//! 4. Default values (lowest priority)
//!
//! ## Usage
//! ```rust,no_run
//! use statute_qa::config::Config;
//!
//! # fn main() -> statute_qa::Result<()> {
//! let config = Config::from_file("config.toml")?;
//! println!("Server port: {}", config.server.port);
//! # Ok(())
//! # }
//! ```

use crate::errors::{QaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Source document settings
    pub document: DocumentConfig,
    /// Chunking parameters
    pub chunking: ChunkingConfig,
    /// Retrieval behavior
    pub retrieval: RetrievalConfig,
    /// Language-model collaborator settings
    pub llm: LlmConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of HTTP worker threads
    pub workers: usize,
    /// Enable permissive CORS for web frontends
    pub enable_cors: bool,
}

/// Source document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Path to the pre-extracted document text. Pages are separated by form
    /// feeds (`\x0c`), the conventional page delimiter of text extractors.
    pub path: PathBuf,
}

/// Chunking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters of overlap carried into each subsequent chunk
    pub overlap: usize,
}

/// Relevance ranking strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelevanceStrategy {
    /// Term/keyword overlap scoring, no external dependency
    Lexical,
    /// Dense-vector cosine similarity via an embedding backend
    Embedding,
}

/// Retrieval behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Relevance ranking strategy
    pub strategy: RelevanceStrategy,
    /// Retrieval breadth: chunks requested from the relevance index
    pub top_k: usize,
    /// Upper bound on merged context chunks handed to the language model
    pub max_context_chunks: usize,
    /// Chunks returned in corpus order when nothing scores above zero
    pub fallback_chunks: usize,
    /// Maximum accepted query length in characters
    pub max_query_chars: usize,
}

/// Language-model collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat-completions endpoint (OpenAI-compatible)
    pub api_url: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// API key; `GROQ_API_KEY` overrides this at startup
    pub api_key: Option<String>,
    /// Request timeout in seconds for the external call
    pub request_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| QaError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| QaError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("STATUTE_QA_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("STATUTE_QA_PORT") {
            self.server.port = port.parse().map_err(|_| QaError::Config {
                message: "Invalid port number in STATUTE_QA_PORT".to_string(),
            })?;
        }
        if let Ok(document) = std::env::var("STATUTE_QA_DOCUMENT") {
            self.document.path = PathBuf::from(document);
        }
        if let Ok(api_key) = std::env::var("GROQ_API_KEY") {
            self.llm.api_key = Some(api_key);
        }
        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(QaError::ValidationFailed {
                field: "server.port".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }

        if self.chunking.chunk_size == 0 {
            return Err(QaError::ValidationFailed {
                field: "chunking.chunk_size".to_string(),
                reason: "Chunk size must be greater than zero".to_string(),
            });
        }

        // overlap >= chunk_size would make the splitter re-cover the same span forever
        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(QaError::ValidationFailed {
                field: "chunking.overlap".to_string(),
                reason: format!(
                    "Overlap ({}) must be smaller than chunk size ({})",
                    self.chunking.overlap, self.chunking.chunk_size
                ),
            });
        }

        if self.retrieval.top_k == 0 {
            return Err(QaError::ValidationFailed {
                field: "retrieval.top_k".to_string(),
                reason: "top_k must be at least 1".to_string(),
            });
        }

        if self.retrieval.max_context_chunks == 0 {
            return Err(QaError::ValidationFailed {
                field: "retrieval.max_context_chunks".to_string(),
                reason: "max_context_chunks must be at least 1".to_string(),
            });
        }

        if self.retrieval.max_query_chars == 0 {
            return Err(QaError::ValidationFailed {
                field: "retrieval.max_query_chars".to_string(),
                reason: "max_query_chars must be at least 1".to_string(),
            });
        }

        if self.llm.api_url.is_empty() {
            return Err(QaError::ValidationFailed {
                field: "llm.api_url".to_string(),
                reason: "API URL cannot be empty".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(QaError::ValidationFailed {
                field: "llm.temperature".to_string(),
                reason: "Temperature must be within [0.0, 2.0]".to_string(),
            });
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| QaError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                workers: num_cpus::get(),
                enable_cors: true,
            },
            document: DocumentConfig {
                path: PathBuf::from("data/indian-penal-code-1860.txt"),
            },
            chunking: ChunkingConfig {
                chunk_size: 3000,
                overlap: 200,
            },
            retrieval: RetrievalConfig {
                strategy: RelevanceStrategy::Lexical,
                top_k: 8,
                max_context_chunks: 10,
                fallback_chunks: 5,
                max_query_chars: 1000,
            },
            llm: LlmConfig {
                api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
                model: "llama-3.3-70b-versatile".to_string(),
                temperature: 0.1,
                api_key: None,
                request_timeout_seconds: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}
