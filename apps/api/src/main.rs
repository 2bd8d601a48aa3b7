mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod reporting;
mod routes;
mod source;
mod state;
mod store;
mod themes;
mod triage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{LlmClient, Oracle};
use crate::routes::build_router;
use crate::source::{HttpReviewSource, ReviewSource};
use crate::state::AppState;
use crate::store::PgReviewStore;
use crate::themes::references::FsReferenceStore;

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

    info!("Starting Triage API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgReviewStore::new(db));

    // Initialize oracle client (optional: stored plans and reports work without it)
    let oracle: Option<Arc<dyn Oracle>> = match &config.oracle_api_key {
        Some(key) => {
            let client = LlmClient::new(
                key.clone(),
                config.oracle_base_url.clone(),
                config.oracle_model.clone(),
                config.oracle_cluster_model.clone(),
            )?;
            info!("LLM client initialized (model: {})", client.model());
            Some(Arc::new(client))
        }
        None => {
            warn!("OPENAI_API_KEY not set; process and plan generation are disabled");
            None
        }
    };

    // Initialize review source
    let source: Option<Arc<dyn ReviewSource>> = match &config.review_source_url {
        Some(url) => {
            info!("Review source: {url}");
            Some(Arc::new(HttpReviewSource::new(url)?))
        }
        None => {
            info!("REVIEW_SOURCE_URL not set; process will triage stored reviews only");
            None
        }
    };

    let references = Arc::new(FsReferenceStore::new(config.workflows_dir.clone()));
    info!("Reference workflows: {}", config.workflows_dir.display());

    // Build app state
    let state = AppState {
        store,
        oracle,
        source,
        references,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
