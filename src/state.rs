use serde::Serialize;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::{NegotiatorError, SessionNegotiator};

/// Shared state handed to every handler.
///
/// Owns the one [`SessionNegotiator`] for the process. The shutdown token is
/// the parent of every in-flight negotiation started over HTTP.
pub struct AppState {
    pub config: ServerConfig,
    pub negotiator: SessionNegotiator,
    shutdown: CancellationToken,
    bound_addr: OnceLock<SocketAddr>,
}

/// Snapshot returned by `GET /api/realtime/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub running: bool,
    /// `host:port` the listener is bound to, once bound
    pub address: Option<String>,
    /// Base URL browsers should use
    pub url: Option<String>,
    pub voice: String,
    pub model: String,
    pub api_key_configured: bool,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, NegotiatorError> {
        let negotiator =
            SessionNegotiator::new(config.negotiator_config(), config.upstream_config())?;

        info!(
            "Session negotiator ready (upstream: {}, voice: {}, model: {})",
            negotiator.upstream().url,
            config.default_voice,
            config.default_model
        );

        Ok(Arc::new(Self {
            config,
            negotiator,
            shutdown: CancellationToken::new(),
            bound_addr: OnceLock::new(),
        }))
    }

    /// Token cancelled when the server begins shutting down.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Record the listener address. Only the first call has an effect.
    pub fn set_bound_addr(&self, addr: SocketAddr) {
        let _ = self.bound_addr.set(addr);
    }

    pub fn bound_addr(&self) -> Option<SocketAddr> {
        self.bound_addr.get().copied()
    }

    pub fn is_running(&self) -> bool {
        self.bound_addr.get().is_some() && !self.shutdown.is_cancelled()
    }

    pub fn status(&self) -> ServiceStatus {
        let snapshot = self.negotiator.config();
        let scheme = if self.config.is_tls_enabled() {
            "https"
        } else {
            "http"
        };

        ServiceStatus {
            running: self.is_running(),
            address: self.bound_addr().map(|addr| addr.to_string()),
            url: self
                .bound_addr()
                .map(|addr| format!("{scheme}://{addr}")),
            voice: snapshot.default_voice.clone(),
            model: snapshot.default_model.clone(),
            api_key_configured: snapshot.usable_api_key().is_some(),
        }
    }
}
