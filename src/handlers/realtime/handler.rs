use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::negotiator::SDP_CONTENT_TYPE;
use crate::core::{NegotiationRequest, NegotiationResult};
use crate::state::{AppState, ServiceStatus};

/// Exchange a browser's SDP offer for the upstream's SDP answer
///
/// The body is JSON `{ "sdpOffer": "...", "voice"?: "...", "model"?: "..." }`.
/// A body that is missing or does not parse is treated as a request without
/// an offer.
///
/// # Returns
/// * `200` with `Content-Type: application/sdp` and the raw answer
/// * the failure's status with a plain-text message, or a JSON
///   `{ "error", "kind" }` body when the caller accepts `application/json`
///
/// The negotiation is cancelled if the server starts shutting down while the
/// upstream call is in flight.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = NegotiationRequest::from_json_slice(&body);
    let cancel = state.shutdown_token().child_token();

    match state.negotiator.negotiate_with_cancel(request, &cancel).await {
        NegotiationResult::Answer { sdp } => {
            info!(bytes = sdp.len(), "SDP answer relayed");
            (
                [(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(SDP_CONTENT_TYPE),
                )],
                sdp,
            )
                .into_response()
        }
        NegotiationResult::Failure(failure) => {
            debug!(status = %failure.status, kind = %failure.kind, "Session negotiation failed");
            if accepts_json(&headers) {
                failure.into_json_response()
            } else {
                failure.into_response()
            }
        }
    }
}

/// Report whether the server is running and which defaults are in effect
pub async fn session_status(State(state): State<Arc<AppState>>) -> Json<ServiceStatus> {
    Json(state.status())
}

/// True when the `Accept` header names `application/json`.
fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|media| {
            media
                .split(';')
                .next()
                .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        })
}
