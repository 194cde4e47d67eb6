//! # Language Model Module
//!
//! ## Purpose
//! Client for the external language-model collaborator. The retrieval core
//! hands it a finished context block and the question; it returns free text.
//! The response is not parsed or validated beyond extraction.
//!
//! ## Input/Output Specification
//! - **Input**: `(context, question)` pair, rendered into a fixed prompt
//! - **Output**: Plain-text answer from an OpenAI-compatible chat endpoint
//! - **Failure**: Transport, status, and payload problems surface as distinct
//!   backend errors; no retries here, retry policy belongs to the caller

use crate::config::LlmConfig;
use crate::errors::{QaError, Result};
use crate::utils::TextUtils;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prompt handed to the model, with `{context}` and `{question}` placeholders.
pub const PROMPT_TEMPLATE: &str = "\
You are an expert legal assistant specializing in the Indian Penal Code 1860.
Use ONLY the following context from the IPC document to answer the question.
If a specific section is mentioned, quote the exact text.

Context from IPC Document:
{context}

Question: {question}

Provide a clear, accurate answer based on the context above:";

/// Fill the prompt template.
pub fn render_prompt(context: &str, question: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}

/// External collaborator that synthesizes an answer from retrieved context.
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    /// Produce an answer for the question given the assembled context
    async fn answer(&self, context: &str, question: &str) -> Result<String>;
}

/// Chat-completions client for the Groq API (OpenAI-compatible).
pub struct GroqClient {
    http: reqwest::Client,
    config: LlmConfig,
    api_key: String,
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient").finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl GroqClient {
    /// Create a client; fails when no API key is configured.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| QaError::Config {
            message: "GROQ_API_KEY is not set".to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            config,
            api_key,
        })
    }
}

#[async_trait]
impl AnswerBackend for GroqClient {
    async fn answer(&self, context: &str, question: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: render_prompt(context, question),
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| QaError::Backend {
                provider: "groq".to_string(),
                details: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(QaError::BackendStatus {
                provider: "groq".to_string(),
                status,
                body: TextUtils::truncate(&body, 300),
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| QaError::BackendResponse {
            provider: "groq".to_string(),
            details: e.to_string(),
        })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| QaError::BackendResponse {
                provider: "groq".to_string(),
                details: "response contained no choices".to_string(),
            })
    }
}
