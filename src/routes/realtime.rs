//! Realtime negotiation route configuration
//!
//! The router returned here is nested under `/api/realtime` by the server,
//! and can be nested the same way into any other axum application that
//! holds an `Arc<AppState>`.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::realtime::{create_session, session_status};
use crate::state::AppState;
use std::sync::Arc;

/// Create the realtime negotiation router
///
/// # Endpoints
///
/// - `POST /session` - exchange an SDP offer for an SDP answer
/// - `GET /status` - service status snapshot
///
/// # Example
///
/// ```text
/// POST /api/realtime/session
/// Content-Type: application/json
///
/// {"sdpOffer": "v=0\r\no=- 4611731400430051336 2 IN IP4 127.0.0.1\r\n...", "voice": "alloy"}
///
/// 200 OK
/// Content-Type: application/sdp
///
/// v=0
/// o=- 1 1 IN IP4 0.0.0.0
/// ...
/// ```
pub fn create_realtime_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", post(create_session))
        .route("/status", get(session_status))
        .layer(TraceLayer::new_for_http())
}
