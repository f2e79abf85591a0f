//! Negotiation outcomes and error taxonomy.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::messages::ErrorBody;

pub const MISSING_API_KEY_MESSAGE: &str = "Missing API key";
pub const BAD_SDP_OFFER_MESSAGE: &str = "Bad SDP offer";
pub const NO_SDP_ANSWER_MESSAGE: &str = "No SDP answer";
pub const SDP_EXCHANGE_FAILED_MESSAGE: &str = "SDP exchange failed";
pub const CANCELLED_MESSAGE: &str = "Request cancelled";

/// Non-standard status for requests the client abandoned.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

// =============================================================================
// Error Kinds
// =============================================================================

/// Why a negotiation did not produce an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The relay has no usable credential
    ConfigurationError,
    /// The caller's offer is missing or is not an SDP document
    InvalidInput,
    /// The upstream API answered, but not with an SDP answer
    UpstreamRejected,
    /// The upstream API could not be reached or timed out
    TransportError,
    /// The negotiation was abandoned before the upstream answered
    Cancelled,
}

impl ErrorKind {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationError => "configuration_error",
            Self::InvalidInput => "invalid_input",
            Self::UpstreamRejected => "upstream_rejected",
            Self::TransportError => "transport_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Failure
// =============================================================================

/// A terminal negotiation failure: the status and body the caller receives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} ({status}): {body}")]
pub struct NegotiationFailure {
    pub status: StatusCode,
    pub body: String,
    pub kind: ErrorKind,
}

impl NegotiationFailure {
    pub fn missing_api_key() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: MISSING_API_KEY_MESSAGE.to_string(),
            kind: ErrorKind::ConfigurationError,
        }
    }

    pub fn bad_offer() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: BAD_SDP_OFFER_MESSAGE.to_string(),
            kind: ErrorKind::InvalidInput,
        }
    }

    /// Failure carrying the upstream's own status and body.
    ///
    /// A success status paired with a non-SDP body becomes 502, so that a
    /// failure is never reported to the caller as 2xx. An empty body is
    /// replaced by a fixed message.
    pub fn upstream_rejected(status: StatusCode, body: impl Into<String>) -> Self {
        let status = if status.is_success() || status.is_informational() {
            StatusCode::BAD_GATEWAY
        } else {
            status
        };
        let body = body.into();
        let body = if body.is_empty() {
            NO_SDP_ANSWER_MESSAGE.to_string()
        } else {
            body
        };

        Self {
            status,
            body,
            kind: ErrorKind::UpstreamRejected,
        }
    }

    pub fn transport() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: SDP_EXCHANGE_FAILED_MESSAGE.to_string(),
            kind: ErrorKind::TransportError,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
                .unwrap_or(StatusCode::REQUEST_TIMEOUT),
            body: CANCELLED_MESSAGE.to_string(),
            kind: ErrorKind::Cancelled,
        }
    }

    /// JSON rendering: `{"error": "...", "kind": "..."}`.
    pub fn into_json_response(self) -> Response {
        let body = ErrorBody {
            error: self.body,
            kind: self.kind,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Plain-text rendering, the shape existing browser clients expect.
impl IntoResponse for NegotiationFailure {
    fn into_response(self) -> Response {
        (
            self.status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )],
            self.body,
        )
            .into_response()
    }
}

// =============================================================================
// Result
// =============================================================================

/// Outcome of one negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationResult {
    /// The upstream's SDP answer, byte for byte as received
    Answer { sdp: Bytes },
    Failure(NegotiationFailure),
}

impl NegotiationResult {
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer { .. })
    }

    /// The failure kind, or `None` for an answer.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Answer { .. } => None,
            Self::Failure(failure) => Some(failure.kind),
        }
    }

    pub fn into_result(self) -> Result<Bytes, NegotiationFailure> {
        match self {
            Self::Answer { sdp } => Ok(sdp),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl From<NegotiationFailure> for NegotiationResult {
    fn from(failure: NegotiationFailure) -> Self {
        Self::Failure(failure)
    }
}

// =============================================================================
// Construction Errors
// =============================================================================

/// Errors raised while building a negotiator, before any request is served.
#[derive(Debug, Error)]
pub enum NegotiatorError {
    #[error("Invalid upstream URL: {0}")]
    InvalidUpstreamUrl(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
}
