use std::sync::Arc;

use jsonwebtoken::DecodingKey;

use eva_core::config::EvaConfig;
use eva_generation::orchestrator::Orchestrator;
use eva_ledger::ledger::Ledger;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EvaConfig>,
    pub orchestrator: Arc<Orchestrator>,
    pub jwt_key: Arc<DecodingKey>,
}

impl AppState {
    pub fn new(config: Arc<EvaConfig>, orchestrator: Arc<Orchestrator>) -> Self {
        let jwt_key = Arc::new(DecodingKey::from_secret(config.server.jwt_secret.as_bytes()));
        Self {
            config,
            orchestrator,
            jwt_key,
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        self.orchestrator.ledger()
    }
}
