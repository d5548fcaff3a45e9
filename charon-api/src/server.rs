//! API server configuration, shared state, and lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::Router;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use charon_ledger::{CommitmentLedger, LedgerStore};
use charon_relay::RelayStatus;

use crate::service::ProofService;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Listen address.
    pub listen_addr: SocketAddr,
    /// Enable CORS.
    pub cors_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8555".parse().expect("static address parses"),
            cors_enabled: true,
        }
    }
}

/// Shared API state.
pub struct ApiState<S> {
    service: ProofService<S>,
    relay_status: RwLock<Option<Arc<RelayStatus>>>,
    start_time: Instant,
}

impl<S: LedgerStore> ApiState<S> {
    /// Create state over a shared ledger.
    pub fn new(ledger: Arc<RwLock<CommitmentLedger<S>>>) -> Self {
        Self {
            service: ProofService::new(ledger),
            relay_status: RwLock::new(None),
            start_time: Instant::now(),
        }
    }

    /// The proof service.
    pub fn service(&self) -> &ProofService<S> {
        &self.service
    }

    /// Expose a relay's liveness through `/api/status`.
    pub fn attach_relay_status(&self, status: Arc<RelayStatus>) {
        *self.relay_status.write() = Some(status);
    }

    /// Relay liveness, when a relay is attached.
    pub fn relay_running(&self) -> Option<bool> {
        self.relay_status.read().as_ref().map(|s| s.is_running())
    }

    /// Server uptime.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// The proof-serving API server.
pub struct ApiServer<S> {
    config: ApiConfig,
    state: Arc<ApiState<S>>,
}

impl<S: LedgerStore + 'static> ApiServer<S> {
    /// Create a server over a shared ledger.
    pub fn new(config: ApiConfig, ledger: Arc<RwLock<CommitmentLedger<S>>>) -> Self {
        Self {
            config,
            state: Arc::new(ApiState::new(ledger)),
        }
    }

    /// Attach a relay's status for the `/api/status` endpoint.
    pub fn with_relay_status(self, status: Arc<RelayStatus>) -> Self {
        self.state.attach_relay_status(status);
        self
    }

    /// Get a reference to the shared state.
    pub fn state(&self) -> Arc<ApiState<S>> {
        self.state.clone()
    }

    /// Create the router with all middleware.
    pub fn router(&self) -> Router {
        let cors = if self.config.cors_enabled {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([CONTENT_TYPE])
        } else {
            CorsLayer::new()
        };

        let middleware = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors);

        crate::rest::create_router::<S>()
            .layer(middleware)
            .with_state(self.state.clone())
    }

    /// Run the server.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let router = self.router();
        let listener = TcpListener::bind(&self.config.listen_addr).await?;

        info!("proof API listening on {}", self.config.listen_addr);

        axum::serve(listener, router).await.map_err(|e| e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charon_ledger::MemStore;

    fn shared_ledger() -> Arc<RwLock<CommitmentLedger<MemStore>>> {
        Arc::new(RwLock::new(CommitmentLedger::new(MemStore::new())))
    }

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert_eq!(config.listen_addr.port(), 8555);
        assert!(config.cors_enabled);
    }

    #[test]
    fn test_state_creation() {
        let state = ApiState::new(shared_ledger());
        assert_eq!(state.service().leaf_count(), 0);
        assert!(state.relay_running().is_none());
        assert!(state.uptime() < Duration::from_secs(1));
    }

    #[test]
    fn test_router_creation() {
        let server = ApiServer::new(ApiConfig::default(), shared_ledger());
        let _router = server.router();
    }

    #[test]
    fn test_relay_status_attachment() {
        let status = Arc::new(RelayStatus::default());
        let server =
            ApiServer::new(ApiConfig::default(), shared_ledger()).with_relay_status(status);
        assert_eq!(server.state().relay_running(), Some(false));
    }
}
