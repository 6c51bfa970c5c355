//! Line of Destiny API server entry point.

use std::error::Error;
use std::sync::Arc;

use destiny_api::config::AppConfig;
use destiny_api::state::AppState;
use destiny_core::clock::SystemClock;
use destiny_core::rng::{DeterministicRng, OsSeededRng};
use destiny_narrative::application::resolver::ResolverConfig;
use destiny_oracle::GeminiOracle;
use destiny_pvp::application::matchmaking::MatchmakingConfig;
use destiny_session::application::store::{FileSessionStore, InMemorySessionStore, SessionStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Line of Destiny API server");

    let config = AppConfig::from_env()?;

    let store: Arc<dyn SessionStore> = match &config.data_dir {
        Some(dir) => {
            tracing::info!(data_dir = %dir.display(), "persisting sessions to disk");
            Arc::new(FileSessionStore::open(dir).await?)
        }
        None => {
            tracing::warn!("DESTINY_DATA_DIR not set, sessions live in memory only");
            Arc::new(InMemorySessionStore::new())
        }
    };
    tracing::info!(model = %config.gemini.model, "narrative oracle configured");
    let oracle = Arc::new(GeminiOracle::new(config.gemini.clone()));

    let app_state = AppState::assemble(
        store,
        oracle,
        Arc::new(SystemClock),
        Arc::new(|| Box::new(OsSeededRng::new()) as Box<dyn DeterministicRng>),
        ResolverConfig::default(),
        MatchmakingConfig::default(),
    );
    let app = destiny_api::app(app_state);

    let addr = config.bind_address()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
