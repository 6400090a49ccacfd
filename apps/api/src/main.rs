mod auth;
mod cache;
mod config;
mod cover_letter;
mod db;
mod errors;
mod fallback;
mod insights;
mod interview;
mod llm_client;
mod models;
mod resume;
mod routes;
mod state;
mod timeout;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{DisabledGenerator, GeminiClient, TextGenerator};
use crate::routes::build_router;
use crate::state::{AppState, Caches};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Koshi API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;

    let llm: Arc<dyn TextGenerator> = match &config.gemini_api_key {
        Some(key) => {
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(GeminiClient::new(key.clone())?)
        }
        None => {
            warn!("GEMINI_API_KEY not set, every AI feature will serve fallback content");
            Arc::new(DisabledGenerator)
        }
    };
    info!(
        "AI timeouts: {:?} default, {:?} for cover letters",
        config.ai_timeout, config.cover_letter_timeout
    );

    let state = AppState {
        db,
        llm,
        config: config.clone(),
        caches: Arc::new(Caches::default()),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web app's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
