//! Trendscope server entry point

use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use trendscope::{
    config,
    engines::EngineLoader,
    history::HistoryStore,
    network::HttpClient,
    web::{create_router, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = config::load()?;

    // RUST_LOG wins over the configured level
    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting trendscope v{}", trendscope::VERSION);
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    let registry = EngineLoader::load(&settings)?;
    info!("Loaded {} search backends: {:?}", registry.len(), registry.names());

    let history = HistoryStore::connect(&settings.history).await?;
    info!("History store ready at {}", settings.history.database_url);

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    let state = AppState::new(settings, registry, client, history);
    let app = create_router(state);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
