pub mod config;
pub mod core;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use crate::core::*;
pub use server::{VoiceServer, build_router};
pub use state::{AppState, ServiceStatus};
