mod analysis;
mod config;
mod errors;
mod extraction;
mod interview;
mod llm_client;
mod routes;
mod state;
mod upload;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::url_validator::HttpUrlValidator;
use crate::config::Config;
use crate::extraction::{PdfTextExtractor, TextExtractor};
use crate::llm_client::{CompletionClient, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize collaborators
    let llm: Arc<dyn CompletionClient> = Arc::new(LlmClient::new(
        config.openai_api_key.clone(),
        &config.openai_base_url,
        Duration::from_secs(config.completion_timeout_secs),
    )?);
    info!("LLM client initialized (model: {})", config.completion_model);

    let url_validator = Arc::new(HttpUrlValidator::new(Duration::from_secs(
        config.url_check_timeout_secs,
    ))?);
    let extractor: Arc<dyn TextExtractor> = Arc::new(PdfTextExtractor);

    let analyzer = Analyzer::new(
        extractor.clone(),
        llm.clone(),
        url_validator,
        config.completion_model.clone(),
    );
    info!(
        "Batch analysis concurrency: {} file(s) at a time",
        config.batch_concurrency
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        analyzer: Arc::new(analyzer),
        extractor,
        llm,
    };

    let cors_origin: HeaderValue = config
        .cors_origin
        .parse()
        .with_context(|| format!("CORS_ORIGIN '{}' is not a valid origin", config.cors_origin))?;

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors_origin)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
