//! HTTP request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - Health check endpoint
//! - `realtime` - SDP offer/answer negotiation and service status

pub mod api;
pub mod realtime;

// Re-export commonly used handlers for convenient access
pub use realtime::{create_session, session_status};
