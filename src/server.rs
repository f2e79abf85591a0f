//! Router assembly and server lifecycle
//!
//! [`build_router`] wires the public routes, the realtime negotiation routes
//! and the optional browser UI behind the security layers. [`VoiceServer`]
//! binds a listener, serves the router on a background task and shuts it
//! down gracefully on [`VoiceServer::stop`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use http::{
    Method,
    header::{ACCEPT, CONTENT_TYPE},
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::core::{ConfigUpdate, NegotiatorConfig};
use crate::routes;
use crate::state::{AppState, ServiceStatus};

/// Rates at or above this disable rate limiting entirely.
pub const RATE_LIMIT_DISABLED_THRESHOLD: u32 = 100_000;

/// How long TLS connections get to finish after shutdown starts.
const TLS_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Build the complete application router
///
/// # Layout
/// - `GET /health` - liveness probe
/// - `/api/realtime/*` - session negotiation and status
/// - everything else - the static UI, when `static_dir` is configured
///
/// # Errors
/// Returns an error if the rate limiter cannot be configured.
pub fn build_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let config = &state.config;

    let governor_layer = if config.rate_limit_requests_per_second < RATE_LIMIT_DISABLED_THRESHOLD {
        let replenish_interval_ns =
            1_000_000_000 / u64::from(config.rate_limit_requests_per_second.max(1));
        let governor_config = GovernorConfigBuilder::default()
            .per_nanosecond(replenish_interval_ns.max(1))
            .burst_size(config.rate_limit_burst_size)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow!("Failed to build rate limiter config"))?;
        Some(GovernorLayer::new(governor_config))
    } else {
        info!(
            "Rate limiting disabled (rate >= {}/s)",
            RATE_LIMIT_DISABLED_THRESHOLD
        );
        None
    };

    let cors_layer = build_cors_layer(config.cors_allowed_origins.as_deref());

    // Security headers
    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ));

    let mut app = routes::api::create_api_router()
        .nest("/api/realtime", routes::realtime::create_realtime_router())
        .with_state(state.clone());

    if let Some(dir) = &config.static_dir {
        if !dir.is_dir() {
            warn!("Static directory {} does not exist", dir.display());
        }
        let index = dir.join("index.html");
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
        info!("Serving static files from {}", dir.display());
    }

    // CORS wraps the limiter: 429 responses carry CORS headers too
    Ok(app
        .layer(tower::util::option_layer(governor_layer))
        .layer(cors_layer)
        .layer(security_headers))
}

/// CORS policy: `*`, a comma-separated origin list, or same-origin only.
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    match origins {
        Some("*") => base.allow_origin(Any).allow_credentials(false),
        Some(list) => {
            let origins: Vec<_> = list
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            base.allow_origin(origins).allow_credentials(true)
        }
        None => {
            info!(
                "CORS not configured, defaulting to same-origin only. \
                 Set CORS_ALLOWED_ORIGINS to enable cross-origin access."
            );
            base.allow_credentials(false)
        }
    }
}

/// A running relay server
///
/// Dropping the handle without calling [`stop`](Self::stop) still signals
/// shutdown, but does not wait for the serve task to finish.
pub struct VoiceServer {
    state: Arc<AppState>,
    local_addr: SocketAddr,
    task: Option<JoinHandle<anyhow::Result<()>>>,
}

impl VoiceServer {
    /// Bind the configured address and start serving in the background
    ///
    /// Port `0` binds an ephemeral port; use [`local_addr`](Self::local_addr)
    /// to find it.
    ///
    /// # Errors
    /// Returns an error if the negotiator cannot be built, the address cannot
    /// be bound, or the TLS certificate and key cannot be loaded.
    pub async fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let address = config.address();
        let socket_addr: SocketAddr = address
            .parse()
            .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;
        let tls = config.tls.clone();

        let state = AppState::new(config).context("Failed to create session negotiator")?;
        let app = build_router(state.clone())?;
        let shutdown = state.shutdown_token().clone();

        let (local_addr, task) = if let Some(tls) = tls {
            let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .map_err(|e| {
                    anyhow!(
                        "Failed to load TLS certificates from {} and {}: {}",
                        tls.cert_path.display(),
                        tls.key_path.display(),
                        e
                    )
                })?;

            let listener = std::net::TcpListener::bind(socket_addr)
                .with_context(|| format!("Failed to bind {socket_addr}"))?;
            listener.set_nonblocking(true)?;
            let local_addr = listener.local_addr()?;

            let handle = axum_server::Handle::new();
            let watcher = handle.clone();
            tokio::spawn(async move {
                shutdown.cancelled().await;
                watcher.graceful_shutdown(Some(TLS_SHUTDOWN_GRACE));
            });

            info!("Relay listening on https://{} (TLS enabled)", local_addr);

            let task = tokio::spawn(async move {
                axum_server::from_tcp_rustls(listener, rustls_config)
                    .handle(handle)
                    .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                    .await
                    .map_err(|e| anyhow!("TLS server error: {}", e))
            });
            (local_addr, task)
        } else {
            let listener = TcpListener::bind(socket_addr)
                .await
                .with_context(|| format!("Failed to bind {socket_addr}"))?;
            let local_addr = listener.local_addr()?;

            info!("Relay listening on http://{}", local_addr);

            let task = tokio::spawn(async move {
                axum::serve(
                    listener,
                    app.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .map_err(|e| anyhow!("Server error: {}", e))
            });
            (local_addr, task)
        };

        state.set_bound_addr(local_addr);

        Ok(Self {
            state,
            local_addr,
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Base URL for browsers, e.g. `http://127.0.0.1:3000`.
    pub fn url(&self) -> String {
        let scheme = if self.state.config.is_tls_enabled() {
            "https"
        } else {
            "http"
        };
        format!("{scheme}://{}", self.local_addr)
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn status(&self) -> ServiceStatus {
        self.state.status()
    }

    /// Change session defaults for negotiations that start after this call.
    pub fn reconfigure(&self, update: ConfigUpdate) -> Arc<NegotiatorConfig> {
        self.state.negotiator.reconfigure(update)
    }

    /// Stop accepting connections and wait for the serve task to finish
    ///
    /// In-flight negotiations are cancelled and answer with status 499.
    pub async fn stop(mut self) -> anyhow::Result<()> {
        info!("Stopping relay on {}", self.local_addr);
        self.state.shutdown_token().cancel();

        match self.task.take() {
            Some(task) => match task.await {
                Ok(result) => result,
                Err(e) => {
                    error!("Server task failed: {}", e);
                    Err(anyhow!("Server task failed: {}", e))
                }
            },
            None => Ok(()),
        }
    }
}

impl Drop for VoiceServer {
    fn drop(&mut self) {
        self.state.shutdown_token().cancel();
    }
}
