//! Session negotiation configuration types.
//!
//! This module contains the configuration consumed by the [`SessionNegotiator`]:
//! - Upstream endpoint and capability header constants
//! - Session defaults (model, voice, instructions)
//! - The secret credential wrapper
//! - Partial updates applied by reconfiguration
//!
//! [`SessionNegotiator`]: super::SessionNegotiator

use std::fmt;
use std::time::Duration;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// OpenAI Realtime WebRTC negotiation endpoint.
pub const OPENAI_REALTIME_URL: &str = "https://api.openai.com/v1/realtime";

/// Model used when the caller does not pick one.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview";

/// Voice used when neither the caller nor the operator picks one.
pub const DEFAULT_REALTIME_VOICE: &str = "marin";

/// System prompt used when the operator does not configure one.
pub const DEFAULT_REALTIME_INSTRUCTIONS: &str = "You are an AI assistant. Always respond in English only. Be conversational and helpful.";

/// Header naming the beta capability requested from the upstream API.
pub const REALTIME_BETA_HEADER: &str = "OpenAI-Beta";

/// Value sent in [`REALTIME_BETA_HEADER`].
pub const REALTIME_BETA_VALUE: &str = "realtime=v1";

/// Media type of SDP documents, both directions.
pub const SDP_CONTENT_TYPE: &str = "application/sdp";

/// Default bound on a single upstream exchange.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(20);

// =============================================================================
// Credential
// =============================================================================

/// Upstream API credential.
///
/// The key is wiped from memory when dropped and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building the `Authorization` header.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

// =============================================================================
// Negotiator Configuration
// =============================================================================

/// Operator-controlled settings applied to every negotiation.
///
/// A negotiation reads one snapshot of this value for its whole duration;
/// reconfiguration swaps in a new value rather than mutating fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatorConfig {
    /// Credential for the upstream API. Checked on every call, not at startup.
    pub api_key: Option<ApiKey>,

    /// Voice used when the request does not name one
    pub default_voice: String,

    /// System instructions sent upstream on every call
    pub default_instructions: String,

    /// Model used when the request does not name one
    pub default_model: String,
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_voice: DEFAULT_REALTIME_VOICE.to_string(),
            default_instructions: DEFAULT_REALTIME_INSTRUCTIONS.to_string(),
            default_model: DEFAULT_REALTIME_MODEL.to_string(),
        }
    }
}

impl NegotiatorConfig {
    /// Create a configuration with the given credential and default session settings.
    pub fn new(api_key: impl Into<ApiKey>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// The credential, if one is configured and non-blank.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .map(ApiKey::expose)
    }

    /// Build the configuration that results from applying `update` to `self`.
    ///
    /// Unset or empty fields in the update keep their current value.
    pub fn merged(&self, update: &ConfigUpdate) -> Self {
        fn pick(current: &str, update: &Option<String>) -> String {
            match update.as_deref() {
                Some(value) if !value.is_empty() => value.to_string(),
                _ => current.to_string(),
            }
        }

        let api_key = match update.api_key.as_deref() {
            Some(key) if !key.is_empty() => Some(ApiKey::from(key)),
            _ => self.api_key.clone(),
        };

        Self {
            api_key,
            default_voice: pick(&self.default_voice, &update.voice),
            default_instructions: pick(&self.default_instructions, &update.instructions),
            default_model: pick(&self.default_model, &update.model),
        }
    }
}

/// Partial update for [`NegotiatorConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub voice: Option<String>,
    pub instructions: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        [&self.voice, &self.instructions, &self.model, &self.api_key]
            .iter()
            .all(|field| field.as_deref().is_none_or(str::is_empty))
    }
}

// =============================================================================
// Upstream Configuration
// =============================================================================

/// Where and how the negotiator reaches the upstream API.
///
/// Fixed for the lifetime of a negotiator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Negotiation endpoint; session parameters are appended as query pairs
    pub url: String,

    /// Upper bound on one exchange, connect through body read
    pub timeout: Duration,

    /// Value for the [`REALTIME_BETA_HEADER`] header
    pub beta_header: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: OPENAI_REALTIME_URL.to_string(),
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
            beta_header: REALTIME_BETA_VALUE.to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
