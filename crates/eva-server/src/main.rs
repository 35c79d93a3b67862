use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use eva_core::config::EvaConfig;
use eva_generation::orchestrator::Orchestrator;
use eva_ledger::ledger::Ledger;
use eva_ledger::snapshot::SnapshotStore;
use eva_providers::client::build_client;
use eva_providers::registry::ProviderSet;
use eva_server::state::AppState;
use eva_storage::artifact::ArtifactFetcher;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Structured JSON logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Arc::new(EvaConfig::from_env()?);
    if config.server.jwt_secret.is_empty() {
        eyre::bail!("JWT_SECRET must be set");
    }

    tokio::fs::create_dir_all(&config.media.root).await?;
    let store = Arc::new(SnapshotStore::open(&config.server.ledger_path).await?);
    let ledger = Arc::new(Ledger::new(store));

    let providers = ProviderSet::from_config(&config)?;
    let fetcher = Arc::new(ArtifactFetcher::from_config(build_client()?, &config.media).await);
    let orchestrator = Arc::new(Orchestrator::new(&config, ledger, providers, fetcher));

    let state = AppState::new(config.clone(), orchestrator);
    let app = eva_server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(addr = %config.server.bind_addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
