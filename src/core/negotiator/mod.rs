//! SDP session negotiation with a hosted realtime voice API.
//!
//! A browser creates an `RTCPeerConnection`, produces an SDP offer and posts
//! it to the relay. The relay forwards the offer to the upstream realtime API
//! together with the operator's session settings and credential, then hands
//! the SDP answer back untouched. The credential never leaves the server.
//!
//! # Validation Order
//!
//! 1. Credential present, else `ConfigurationError` (500)
//! 2. Offer starts with `v=0`, else `InvalidInput` (400)
//! 3. Voice: request, else configured default
//! 4. Instructions: always the configured value
//! 5. Model: request, else configured default
//!
//! # Example
//!
//! ```rust,no_run
//! use realtime_voice_relay::core::negotiator::{
//!     NegotiationRequest, NegotiationResult, NegotiatorConfig, SessionNegotiator,
//!     UpstreamConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let negotiator = SessionNegotiator::new(
//!     NegotiatorConfig::new("sk-..."),
//!     UpstreamConfig::default(),
//! )?;
//!
//! let offer = "v=0\r\no=- 4611731400430051336 2 IN IP4 127.0.0.1\r\n...";
//! match negotiator.negotiate(NegotiationRequest::with_offer(offer)).await {
//!     NegotiationResult::Answer { sdp } => println!("{}", String::from_utf8_lossy(&sdp)),
//!     NegotiationResult::Failure(failure) => eprintln!("{failure}"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod messages;
mod result;
pub mod sdp;

pub use client::SessionNegotiator;
pub use config::{
    ApiKey, ConfigUpdate, DEFAULT_REALTIME_INSTRUCTIONS, DEFAULT_REALTIME_MODEL,
    DEFAULT_REALTIME_VOICE, DEFAULT_UPSTREAM_TIMEOUT, NegotiatorConfig, OPENAI_REALTIME_URL,
    REALTIME_BETA_HEADER, REALTIME_BETA_VALUE, SDP_CONTENT_TYPE, UpstreamConfig,
};
pub use messages::{ErrorBody, NegotiationRequest};
pub use result::{
    BAD_SDP_OFFER_MESSAGE, CANCELLED_MESSAGE, CLIENT_CLOSED_REQUEST, ErrorKind,
    MISSING_API_KEY_MESSAGE, NO_SDP_ANSWER_MESSAGE, NegotiationFailure, NegotiationResult,
    NegotiatorError, SDP_EXCHANGE_FAILED_MESSAGE,
};
