//! # Statute QA Main Driver
//!
//! ## Purpose
//! Main entry point for the question-answering server. Orchestrates
//! configuration loading, one-time retrieval-index construction, and the web
//! server for handling questions.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Load the document and build the retrieval index (single writer;
//!    serving starts only after the build completes)
//! 4. Construct the language-model client
//! 5. Start the web API server
//! 6. Handle shutdown signals gracefully

use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use statute_qa::{
    api::ApiServer,
    chunking::ChunkCorpus,
    config::Config,
    document,
    errors::Result,
    llm::{AnswerBackend, GroqClient},
    retrieval::RetrievalIndex,
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("statute-qa-server")
        .version("0.1.0")
        .author("Legal Search Team")
        .about("Retrieval-augmented question answering over the Indian Penal Code 1860")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("document")
                .short('d')
                .long("document")
                .value_name("FILE")
                .help("Pre-extracted document text path"),
        )
        .arg(
            Arg::new("validate-only")
                .long("validate-only")
                .help("Build the retrieval index, print its stats, and exit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    // Load configuration
    let config_path = matches.get_one::<String>("config").unwrap();
    let mut config = Config::from_file(config_path)?;

    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }
    if let Some(document_path) = matches.get_one::<String>("document") {
        config.document.path = PathBuf::from(document_path);
    }

    let config = Arc::new(config);

    // Initialize logging
    init_logging(&config);

    info!("Starting Statute QA v0.1.0");
    info!("Configuration loaded from: {}", config_path);

    // Build the retrieval index before serving anything
    let index = Arc::new(build_index(&config).await?);

    if matches.get_flag("validate-only") {
        let stats = index.stats();
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    // Construct the language-model collaborator
    let llm: Option<Arc<dyn AnswerBackend>> = match GroqClient::new(config.llm.clone()) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!(
                "Language-model collaborator unavailable: {}. /ask will answer 503",
                e
            );
            None
        }
    };

    let app_state = AppState {
        config: config.clone(),
        index,
        llm,
    };

    // Start the API server
    let server = ApiServer::new(app_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Server error: {}", e);
        }
    });

    info!(
        "Statute QA started on {}:{}",
        config.server.host, config.server.port
    );

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = server_handle => {
            warn!("Server stopped unexpectedly");
        }
    }

    info!("Statute QA shut down");
    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Load the document and build the retrieval index.
///
/// A document that cannot be loaded leaves the service running with an empty
/// corpus; status endpoints report `initialized: false` and retrieval
/// degrades to empty context.
async fn build_index(config: &Config) -> Result<RetrievalIndex> {
    match document::load_pages(&config.document).await {
        Ok(pages) => RetrievalIndex::build(pages, config).await,
        Err(e) => {
            warn!("{}. Serving degraded with an empty corpus", e);
            Ok(RetrievalIndex::from_corpus(
                ChunkCorpus::empty(),
                config.retrieval.clone(),
            ))
        }
    }
}
