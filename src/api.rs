//! # API Server Module
//!
//! ## Purpose
//! REST API server exposing the question-answering flow: retrieval over the
//! statute corpus followed by answer synthesis through the language-model
//! collaborator.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with natural-language queries
//! - **Output**: JSON responses with answers, status, and corpus statistics
//! - **Endpoints**: `/`, `/health`, `/stats`, `/ask`, `/chat`
//!
//! ## Key Features
//! - Stateless request handling over a shared immutable index
//! - Structured JSON error responses
//! - CORS support for web frontends

use crate::errors::{QaError, Result};
use crate::retrieval;
use crate::utils::Timer;
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};

/// HTTP server wrapping the shared application state
pub struct ApiServer {
    app_state: crate::AppState,
}

/// Question payload
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: Option<String>,
}

/// Answer payload
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub context_chunks: usize,
    pub query_time_ms: u64,
}

/// Service status payload
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub name: String,
    pub initialized: bool,
    pub chunks: usize,
}

impl ApiServer {
    /// Create new API server
    pub fn new(app_state: crate::AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server until shutdown
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.config.server.host, self.app_state.config.server.port
        );
        let workers = self.app_state.config.server.workers;
        let enable_cors = self.app_state.config.server.enable_cors;
        let app_state = self.app_state;

        tracing::info!("Starting API server on {}", bind_addr);

        let server = HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::permissive()
            } else {
                Cors::default()
            };

            App::new()
                .app_data(web::Data::new(app_state.clone()))
                .wrap(cors)
                .route("/", web::get().to(index_handler))
                .route("/health", web::get().to(health_handler))
                .route("/stats", web::get().to(stats_handler))
                .route("/ask", web::post().to(ask_handler))
                .route("/chat", web::post().to(ask_handler))
        })
        .workers(workers)
        .bind(&bind_addr)
        .map_err(|e| QaError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?
        .run();

        server.await.map_err(|e| QaError::Internal {
            message: format!("Server error: {}", e),
        })?;

        Ok(())
    }
}

/// Service status handler
async fn index_handler(app_state: web::Data<crate::AppState>) -> ActixResult<HttpResponse> {
    let response = StatusResponse {
        status: "online".to_string(),
        name: "Statute QA API".to_string(),
        initialized: app_state.index.ready() && app_state.llm.is_some(),
        chunks: app_state.index.corpus().len(),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// Health check handler
async fn health_handler(app_state: web::Data<crate::AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "initialized": app_state.index.ready() && app_state.llm.is_some(),
    })))
}

/// Statistics handler
async fn stats_handler(app_state: web::Data<crate::AppState>) -> ActixResult<HttpResponse> {
    let response = serde_json::json!({
        "retrieval": app_state.index.stats(),
        "llm_configured": app_state.llm.is_some(),
    });
    Ok(HttpResponse::Ok().json(response))
}

/// Question answering handler (`/ask`, aliased as `/chat`)
async fn ask_handler(
    app_state: web::Data<crate::AppState>,
    request: web::Json<AskRequest>,
) -> ActixResult<HttpResponse> {
    let timer = Timer::new("ask");

    let query = match request.query.as_deref() {
        Some(query) => query,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "No query provided",
            })));
        }
    };

    let llm = match &app_state.llm {
        Some(llm) => llm.clone(),
        None => {
            return Ok(HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "Chatbot not initialized",
            })));
        }
    };

    let chunks = match app_state.index.retrieve(query).await {
        Ok(chunks) => chunks,
        Err(e @ QaError::InvalidQuery { .. }) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": e.to_string(),
            })));
        }
        Err(e) => {
            tracing::error!("Retrieval error: {}", e);
            return Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Retrieval failed",
                "message": e.to_string(),
            })));
        }
    };

    let context = retrieval::assemble(&chunks);

    match llm.answer(&context, query).await {
        Ok(answer) => Ok(HttpResponse::Ok().json(AskResponse {
            answer,
            context_chunks: chunks.len(),
            query_time_ms: timer.stop(),
        })),
        Err(e) => {
            tracing::error!("Backend error ({}): {}", e.category(), e);
            Ok(HttpResponse::BadGateway().json(serde_json::json!({
                "error": "Answer synthesis failed",
                "message": e.to_string(),
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkCorpus;
    use crate::config::Config;
    use crate::retrieval::RetrievalIndex;
    use crate::{AppState, Chunk, ChunkProvenance};
    use actix_web::{body::to_bytes, http::StatusCode};
    use std::sync::Arc;

    struct CannedBackend;

    #[async_trait::async_trait]
    impl crate::llm::AnswerBackend for CannedBackend {
        async fn answer(&self, _context: &str, _question: &str) -> Result<String> {
            Ok("canned answer".to_string())
        }
    }

    fn app_state(with_llm: bool) -> web::Data<AppState> {
        let config = Arc::new(Config::default());
        let chunks = vec![Chunk::new(
            "Section 378. Theft".to_string(),
            0,
            ChunkProvenance {
                pages: (0, 0),
                chars: (0, 18),
            },
        )];
        let index = Arc::new(RetrievalIndex::from_corpus(
            ChunkCorpus::from_chunks(chunks),
            config.retrieval.clone(),
        ));
        let llm: Option<Arc<dyn crate::llm::AnswerBackend>> = if with_llm {
            Some(Arc::new(CannedBackend))
        } else {
            None
        };
        web::Data::new(AppState { config, index, llm })
    }

    #[actix_web::test]
    async fn test_missing_query_is_a_bad_request() {
        let response = ask_handler(app_state(true), web::Json(AskRequest { query: None }))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_empty_query_is_a_bad_request() {
        let response = ask_handler(
            app_state(true),
            web::Json(AskRequest {
                query: Some("  ".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_uninitialized_llm_is_service_unavailable() {
        let response = ask_handler(
            app_state(false),
            web::Json(AskRequest {
                query: Some("section 378".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_ask_returns_answer() {
        let response = ask_handler(
            app_state(true),
            web::Json(AskRequest {
                query: Some("what is theft under section 378?".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body()).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["answer"], "canned answer");
        assert_eq!(parsed["context_chunks"], 1);
    }

    #[actix_web::test]
    async fn test_status_reports_chunk_count() {
        let response = index_handler(app_state(true)).await.unwrap();
        let body = to_bytes(response.into_body()).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "online");
        assert_eq!(parsed["chunks"], 1);
        assert_eq!(parsed["initialized"], true);
    }
}
