mod config;
mod errors;
mod llm_client;
mod routes;
mod screening;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{GeminiModel, GenerationClient, TextModel};
use crate::routes::build_router;
use crate::screening::conversation::Screener;
use crate::screening::registry::SessionRegistry;
use crate::screening::store::RecordStore;
use crate::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize generation client (no key → fallback bank only)
    let model: Option<Arc<dyn TextModel>> = match &config.gemini_api_key {
        Some(key) => {
            info!("Generation client initialized (model: {})", llm_client::MODEL);
            let gemini: Arc<dyn TextModel> = Arc::new(GeminiModel::new(key.clone()));
            Some(gemini)
        }
        None => {
            warn!("GEMINI_API_KEY not set; technical questions will come from the fallback bank");
            None
        }
    };
    let generator = GenerationClient::new(
        model,
        config.generation_retries,
        Duration::from_millis(config.generation_retry_delay_ms),
    );

    // Initialize record store
    let store = Arc::new(RecordStore::new(config.data_file.clone()));
    match store.load_all().await {
        Ok(records) => info!(
            "Record store at {} holds {} screenings",
            store.path().display(),
            records.len()
        ),
        Err(e) => warn!("Record store is not readable yet; appends will fail until fixed: {e}"),
    }

    if config.hr_password.is_none() {
        warn!("HR_PASSWORD not set; the review dashboard will reject every login");
    }

    let screener = Screener::new(
        generator,
        store,
        config.questions_per_tech,
        config.history_limit,
    );
    info!(
        "Screener ready: {} questions per technology, history limit {}",
        config.questions_per_tech, config.history_limit
    );

    // Session registry with background eviction
    let sessions = SessionRegistry::new();
    sessions.spawn_sweeper(
        SESSION_SWEEP_INTERVAL,
        Duration::from_secs(config.session_idle_ttl_secs),
        Duration::from_secs(config.session_ended_grace_secs),
    );
    info!(
        "Session sweeper started (idle TTL {}s, ended grace {}s)",
        config.session_idle_ttl_secs, config.session_ended_grace_secs
    );

    // Build app state
    let state = AppState { screener, sessions };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the chat UI host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
