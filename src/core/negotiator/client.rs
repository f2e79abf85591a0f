//! Session negotiator implementation.
//!
//! The [`SessionNegotiator`] relays a browser's SDP offer to the upstream
//! realtime API and returns the SDP answer. Each call is one HTTP exchange:
//!
//! 1. Check the credential and the offer (no network traffic on failure)
//! 2. Resolve model, voice and instructions against the configured defaults
//! 3. POST the raw offer with the session parameters in the query string
//! 4. Classify the upstream response into an answer or a failure
//!
//! The negotiator keeps no per-session state. Its only shared data are the
//! pooled HTTP client and the current [`NegotiatorConfig`] snapshot.

use arc_swap::ArcSwap;
use bytes::Bytes;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use super::config::{
    ConfigUpdate, NegotiatorConfig, REALTIME_BETA_HEADER, SDP_CONTENT_TYPE, UpstreamConfig,
};
use super::messages::NegotiationRequest;
use super::result::{NegotiationFailure, NegotiationResult, NegotiatorError};
use super::sdp;

/// Characters of the instructions included in logs.
const INSTRUCTIONS_PREVIEW_CHARS: usize = 50;

/// Characters of a rejected upstream body included in logs.
const UPSTREAM_BODY_PREVIEW_CHARS: usize = 200;

// =============================================================================
// Resolved Session
// =============================================================================

/// Session parameters after validation and default resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedSession<'a> {
    pub api_key: &'a str,
    pub offer: &'a str,
    pub model: &'a str,
    pub voice: &'a str,
    pub instructions: &'a str,
}

/// Apply the validation order and configuration precedence.
///
/// The credential is checked before the offer. Caller-supplied instructions
/// are ignored; the configured instructions are always used.
pub(crate) fn resolve_session<'a>(
    request: &'a NegotiationRequest,
    config: &'a NegotiatorConfig,
) -> Result<ResolvedSession<'a>, NegotiationFailure> {
    let api_key = config
        .usable_api_key()
        .ok_or_else(NegotiationFailure::missing_api_key)?;

    let offer = request
        .sdp_offer
        .as_deref()
        .filter(|offer| sdp::is_sdp_offer(offer))
        .ok_or_else(NegotiationFailure::bad_offer)?;

    let voice = non_empty(request.voice.as_deref()).unwrap_or(config.default_voice.as_str());
    let model = non_empty(request.model.as_deref()).unwrap_or(config.default_model.as_str());

    Ok(ResolvedSession {
        api_key,
        offer,
        model,
        voice,
        instructions: &config.default_instructions,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Turn an upstream status and body into a negotiation result.
///
/// Only a success status together with a body containing an SDP version line
/// counts as an answer; the body is then returned unmodified.
pub(crate) fn classify_response(status: StatusCode, body: Bytes) -> NegotiationResult {
    if status.is_success() && sdp::contains_sdp_answer(&body) {
        return NegotiationResult::Answer { sdp: body };
    }

    let text = String::from_utf8_lossy(&body);
    error!(
        status = status.as_u16(),
        body = sdp::preview(&text, UPSTREAM_BODY_PREVIEW_CHARS),
        "Realtime SDP exchange rejected by upstream"
    );
    NegotiationFailure::upstream_rejected(status, text.into_owned()).into()
}

// =============================================================================
// Session Negotiator
// =============================================================================

/// Relays SDP offers to the upstream realtime API.
///
/// Cheap to share behind an `Arc`: concurrent calls only read the current
/// configuration snapshot, and [`reconfigure`](Self::reconfigure) replaces the
/// whole snapshot atomically.
///
/// # Example
///
/// ```rust,no_run
/// use realtime_voice_relay::core::negotiator::{
///     NegotiationRequest, NegotiatorConfig, SessionNegotiator, UpstreamConfig,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let negotiator = SessionNegotiator::new(
///     NegotiatorConfig::new("sk-..."),
///     UpstreamConfig::default(),
/// )?;
///
/// let request = NegotiationRequest::with_offer("v=0\r\n...").voice("alloy");
/// match negotiator.negotiate(request).await.into_result() {
///     Ok(answer) => println!("answer: {} bytes", answer.len()),
///     Err(failure) => eprintln!("{} {}", failure.status, failure.body),
/// }
/// # Ok(())
/// # }
/// ```
pub struct SessionNegotiator {
    /// Current operator configuration.
    config: ArcSwap<NegotiatorConfig>,

    /// Parsed negotiation endpoint.
    endpoint: Url,

    upstream: UpstreamConfig,

    /// HTTP client for upstream requests (reused for connection pooling).
    http_client: Client,
}

impl SessionNegotiator {
    /// Create a negotiator.
    ///
    /// # Errors
    /// Returns an error if the upstream URL is not an absolute http(s) URL or
    /// the HTTP client cannot be built.
    pub fn new(config: NegotiatorConfig, upstream: UpstreamConfig) -> Result<Self, NegotiatorError> {
        let endpoint = Url::parse(&upstream.url)
            .map_err(|e| NegotiatorError::InvalidUpstreamUrl(format!("{}: {e}", upstream.url)))?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.host_str().is_none() {
            return Err(NegotiatorError::InvalidUpstreamUrl(format!(
                "{}: expected an http(s) URL with a host",
                upstream.url
            )));
        }
        if upstream.timeout.is_zero() {
            return Err(NegotiatorError::InvalidConfiguration(
                "upstream timeout must be greater than zero".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(upstream.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| NegotiatorError::HttpClient(e.to_string()))?;

        Ok(Self {
            config: ArcSwap::from_pointee(config),
            endpoint,
            upstream,
            http_client,
        })
    }

    /// The configuration snapshot new negotiations will use.
    pub fn config(&self) -> Arc<NegotiatorConfig> {
        self.config.load_full()
    }

    pub fn upstream(&self) -> &UpstreamConfig {
        &self.upstream
    }

    /// Apply a partial update, returning the configuration now in effect.
    ///
    /// Negotiations already in flight keep the snapshot they started with.
    pub fn reconfigure(&self, update: ConfigUpdate) -> Arc<NegotiatorConfig> {
        if update.is_empty() {
            debug!("Ignoring empty configuration update");
            return self.config();
        }

        self.config.rcu(|current| current.merged(&update));
        let config = self.config();
        info!(
            voice = %config.default_voice,
            model = %config.default_model,
            "Negotiator configuration updated"
        );
        config
    }

    /// Replace the whole configuration.
    pub fn replace_config(&self, config: NegotiatorConfig) {
        self.config.store(Arc::new(config));
        info!("Negotiator configuration replaced");
    }

    /// Negotiate a session.
    pub async fn negotiate(&self, request: NegotiationRequest) -> NegotiationResult {
        self.negotiate_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Negotiate a session, giving up as soon as `cancel` fires.
    ///
    /// On cancellation the in-flight upstream request is dropped and the
    /// result is a [`Cancelled`](super::ErrorKind::Cancelled) failure.
    pub async fn negotiate_with_cancel(
        &self,
        request: NegotiationRequest,
        cancel: &CancellationToken,
    ) -> NegotiationResult {
        let config = self.config.load_full();

        let session = match resolve_session(&request, &config) {
            Ok(session) => session,
            Err(failure) => {
                warn!(kind = %failure.kind, "Rejecting session request: {}", failure.body);
                return failure.into();
            }
        };

        info!(
            voice = session.voice,
            model = session.model,
            "Setting up realtime session"
        );
        debug!(
            "Instructions: {}...",
            sdp::preview(session.instructions, INSTRUCTIONS_PREVIEW_CHARS)
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Session negotiation cancelled before upstream answered");
                NegotiationFailure::cancelled().into()
            }
            result = self.exchange(&session) => result,
        }
    }

    /// Upstream URL for a session, with parameters percent-encoded.
    pub(crate) fn session_url(&self, session: &ResolvedSession<'_>) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("model", session.model)
            .append_pair("voice", session.voice)
            .append_pair("instructions", session.instructions);
        url
    }

    /// Perform the single upstream exchange.
    async fn exchange(&self, session: &ResolvedSession<'_>) -> NegotiationResult {
        let response = self
            .http_client
            .post(self.session_url(session))
            .bearer_auth(session.api_key)
            .header(CONTENT_TYPE, SDP_CONTENT_TYPE)
            .header(REALTIME_BETA_HEADER, &self.upstream.beta_header)
            .body(session.offer.to_owned())
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                error!(
                    timeout = e.is_timeout(),
                    connect = e.is_connect(),
                    "SDP exchange request failed: {}",
                    e
                );
                return NegotiationFailure::transport().into();
            }
        };

        let status = response.status();
        let body: Bytes = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                error!(
                    status = status.as_u16(),
                    timeout = e.is_timeout(),
                    "Failed to read SDP answer body: {}",
                    e
                );
                return NegotiationFailure::transport().into();
            }
        };

        classify_response(status, body)
    }
}

impl std::fmt::Debug for SessionNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionNegotiator")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.upstream.timeout)
            .field("config", &**self.config.load())
            .finish()
    }
}
