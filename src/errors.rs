//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the question-answering service, providing
//! structured error types and conversion utilities for all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from various system components
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Configuration, Document, Query, Backend, API
//!
//! ## Key Features
//! - Hierarchical error types with detailed context
//! - Automatic error conversion and chaining
//! - User-friendly error messages for API responses
//! - Structured logging integration

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, QaError>;

/// Error types for the question-answering service
#[derive(Debug, Error)]
pub enum QaError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// Source document could not be loaded
    #[error("Failed to load document '{path}': {details}")]
    DocumentLoad { path: String, details: String },

    /// Malformed or empty query submitted by a caller
    #[error("Invalid query: {reason}")]
    InvalidQuery { query: String, reason: String },

    /// Language-model or embedding collaborator unreachable or erroring
    #[error("Backend '{provider}' failed: {details}")]
    Backend { provider: String, details: String },

    /// Collaborator responded with a non-success HTTP status
    #[error("Backend '{provider}' returned {status}: {body}")]
    BackendStatus {
        provider: String,
        status: u16,
        body: String,
    },

    /// Collaborator returned a payload the client could not interpret
    #[error("Backend '{provider}' returned an unusable response: {details}")]
    BackendResponse { provider: String, details: String },

    /// Serialization/deserialization errors
    #[error("Serialization failed: {message}")]
    SerializationFailed { message: String },

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl QaError {
    /// Check if the error is recoverable (can be retried by the caller)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            QaError::Backend { .. } | QaError::BackendStatus { .. }
        )
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            QaError::Config { .. } | QaError::ValidationFailed { .. } => "configuration",
            QaError::DocumentLoad { .. } => "document",
            QaError::InvalidQuery { .. } => "query",
            QaError::Backend { .. }
            | QaError::BackendStatus { .. }
            | QaError::BackendResponse { .. } => "backend",
            QaError::SerializationFailed { .. } | QaError::Internal { .. } => "generic",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for QaError {
    fn from(err: std::io::Error) -> Self {
        QaError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for QaError {
    fn from(err: serde_json::Error) -> Self {
        QaError::SerializationFailed {
            message: format!("JSON serialization error: {}", err),
        }
    }
}

impl From<reqwest::Error> for QaError {
    fn from(err: reqwest::Error) -> Self {
        QaError::Backend {
            provider: "http".to_string(),
            details: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for QaError {
    fn from(err: toml::de::Error) -> Self {
        QaError::Config {
            message: format!("TOML parse error: {}", err),
        }
    }
}

/// Construct an `InvalidQuery` error with a preview of the offending query.
pub fn invalid_query(query: &str, reason: impl Into<String>) -> QaError {
    QaError::InvalidQuery {
        query: crate::utils::TextUtils::truncate(query, 80),
        reason: reason.into(),
    }
}
