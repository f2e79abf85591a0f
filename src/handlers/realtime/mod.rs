//! Realtime session negotiation handlers
//!
//! The browser creates an `RTCPeerConnection`, posts its SDP offer here, and
//! applies the SDP answer returned by the upstream realtime API. Audio then
//! flows directly between the browser and the upstream; this server never
//! touches media.
//!
//! # Endpoints
//!
//! - **POST /api/realtime/session**: exchange an SDP offer for an answer
//! - **GET /api/realtime/status**: current service status and session defaults

mod handler;

pub use handler::{create_session, session_status};
