//! Request and response shapes for session negotiation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::result::ErrorKind;

/// A caller's request to open a realtime voice session.
///
/// On the wire this is `{ "sdpOffer": "...", "model"?: "...", "voice"?: "...",
/// "instructions"?: "..." }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationRequest {
    /// SDP offer produced by the browser's `RTCPeerConnection`
    #[serde(default, deserialize_with = "string_or_none")]
    pub sdp_offer: Option<String>,

    /// Upstream model identifier
    #[serde(default, deserialize_with = "string_or_none")]
    pub model: Option<String>,

    /// Voice for the assistant's audio output
    #[serde(default, deserialize_with = "string_or_none")]
    pub voice: Option<String>,

    /// Accepted for compatibility with existing clients. Never forwarded:
    /// the operator's configured instructions always win.
    #[serde(default, deserialize_with = "string_or_none")]
    pub instructions: Option<String>,
}

impl NegotiationRequest {
    /// Request carrying only an SDP offer.
    pub fn with_offer(offer: impl Into<String>) -> Self {
        Self {
            sdp_offer: Some(offer.into()),
            ..Default::default()
        }
    }

    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Parse a JSON request body.
    ///
    /// An empty or unparsable body yields a request without an offer, which
    /// the negotiator then rejects as invalid input.
    pub fn from_json_slice(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }
        match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("Unparsable session request body: {}", e);
                Self::default()
            }
        }
    }
}

/// Keep a field only when it is a JSON string.
///
/// A wrongly typed optional field must not discard the rest of the request.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => Some(value),
        _ => None,
    })
}

/// Structured error body, returned when the caller asks for JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}
