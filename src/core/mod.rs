pub mod negotiator;

// Re-export commonly used types for convenience
pub use negotiator::{
    ConfigUpdate, ErrorKind, NegotiationFailure, NegotiationRequest, NegotiationResult,
    NegotiatorConfig, NegotiatorError, SessionNegotiator, UpstreamConfig,
};
