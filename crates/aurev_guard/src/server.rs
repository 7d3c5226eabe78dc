//! The AUREV Guard API server.

use crate::adapters::check_services;
use crate::config::GuardConfig;
use crate::error::{Error, Result};
use crate::middleware::assign_request_id;
use crate::rest;
use crate::state::AppState;

use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// The AUREV Guard API server.
///
/// Owns the shared `AppState` and builds the router around it.
pub struct GuardServer {
    state: AppState,
}

impl GuardServer {
    /// Creates a server whose state reads chain data from Blockfrost.
    pub fn new(config: GuardConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    /// Creates a server around a pre-existing `AppState`.
    pub fn with_state(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn config(&self) -> &GuardConfig {
        &self.state.config
    }

    /// Builds the `axum` router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let app = rest::router()
            .with_state(self.state.clone())
            .layer(axum::middleware::from_fn(assign_request_id));

        let app = if self.config().cors_enabled {
            app.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            app
        };

        if self.config().tracing {
            app.layer(TraceLayer::new_for_http())
        } else {
            app
        }
    }

    fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.config().host, self.config().port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))
    }

    /// Probe the sibling agents once and log what is reachable.
    async fn log_service_health(&self) {
        let timeout = Duration::from_millis(self.config().agents.health_timeout_ms);
        let report = check_services(
            &self.state.orchestrator,
            &self.state.ai_model,
            &self.state.payment,
            timeout,
        )
        .await;
        report.log_summary();
    }

    fn log_startup(&self, addr: SocketAddr) {
        let config = self.config();
        info!("Starting AUREV Guard API on http://{}", addr);
        info!(
            environment = %config.environment,
            orchestrator = %config.agents.orchestrator_url,
            ai_agent = %config.agents.ai_agent_url,
            payment_agent = %config.agents.payment_agent_url,
            use_orchestrator = config.agents.use_orchestrator,
            "Agent endpoints"
        );
        if config.blockfrost.api_key.is_none() {
            info!("BLOCKFROST_API_KEY not set; real-data pipeline will fail to fetch chain data");
        }
    }

    /// Runs the server indefinitely.
    pub async fn run(self) -> Result<()> {
        let addr = self.addr()?;
        let router = self.build_router();
        self.log_startup(addr);
        self.log_service_health().await;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Runs the server until `shutdown_signal` completes.
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self.addr()?;
        let router = self.build_router();
        self.log_startup(addr);
        self.log_service_health().await;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        info!("AUREV Guard API stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_is_config_error() {
        let server = GuardServer::new(GuardConfig::for_tests().with_host("not a host"));
        assert!(matches!(server.addr(), Err(Error::Config(_))));
    }

    #[test]
    fn test_addr() {
        let server = GuardServer::new(GuardConfig::for_tests().with_port(3999));
        assert_eq!(server.addr().unwrap().to_string(), "127.0.0.1:3999");
    }
}
