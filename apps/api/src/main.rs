mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod matching;
mod models;
mod normalizer;
mod prediction;
mod recommendation;
mod routes;
mod scoring;
mod state;
mod store;
mod tracking;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{LlmClient, TextCompleter};
use crate::routes::build_router;
use crate::scoring::MatchCache;
use crate::state::{AppState, Repositories};
use crate::store::{MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Persistent store: PostgreSQL when configured, otherwise in-process
    let repos = match &config.database_url {
        Some(url) => {
            let store = Arc::new(PgStore::new(create_pool(url).await?));
            Repositories {
                resumes: store.clone(),
                jobs: store.clone(),
                applications: store,
            }
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            Repositories {
                resumes: store.clone(),
                jobs: store.clone(),
                applications: store,
            }
        }
    };

    // Match cache
    let cache = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).context("Invalid REDIS_URL")?;
            info!("Match cache enabled (ttl {:?})", config.match_cache_ttl);
            Some(MatchCache::new(client, config.match_cache_ttl))
        }
        None => {
            info!("REDIS_URL not set, match cache disabled");
            None
        }
    };

    // LLM extraction collaborator
    let llm: Option<Arc<dyn TextCompleter>> = match &config.anthropic_api_key {
        Some(key) => {
            let client =
                LlmClient::new(key.clone(), config.llm_timeout, config.llm_max_retries)?;
            info!(
                "LLM client initialized (model: {}, deadline {:?})",
                llm_client::MODEL,
                config.extraction_deadline()
            );
            Some(Arc::new(client))
        }
        None => {
            info!("ANTHROPIC_API_KEY not set, using heuristic extraction only");
            None
        }
    };

    let port = config.port;
    let state = AppState::new(config, repos, cache, llm);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
