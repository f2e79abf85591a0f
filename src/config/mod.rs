//! Configuration module for the realtime voice relay
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use realtime_voice_relay::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Relay listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use yaml::{RealtimeYaml, SecurityYaml, ServerYaml, TlsYaml, UiYaml, YamlConfig};

use crate::core::negotiator::{ApiKey, NegotiatorConfig, REALTIME_BETA_VALUE, UpstreamConfig};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RATE_LIMIT_REQUESTS_PER_SECOND: u32 = 60;
pub const DEFAULT_RATE_LIMIT_BURST_SIZE: u32 = 10;

/// TLS configuration for HTTPS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains all configuration needed to run the relay, including:
/// - Server settings (host, port, TLS)
/// - Realtime session defaults and the OpenAI API key
/// - Upstream endpoint and timeout
/// - Browser UI hosting
/// - Security settings (CORS, rate limiting)
#[derive(Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Realtime session settings
    /// OpenAI API key. Absence is reported per request, not at startup.
    pub openai_api_key: Option<String>,
    /// Voice used when the browser does not request one
    /// Default: "marin"
    pub default_voice: String,
    /// System instructions sent with every session
    pub default_instructions: String,
    /// Model used when the browser does not request one
    /// Default: "gpt-4o-realtime-preview"
    pub default_model: String,

    // Upstream
    /// SDP negotiation endpoint
    /// Default: "https://api.openai.com/v1/realtime"
    pub upstream_url: String,
    /// Bound on one SDP exchange, in seconds
    /// Default: 20
    pub upstream_timeout_seconds: u64,

    // UI
    /// Directory with the browser client, served at `/`
    pub static_dir: Option<PathBuf>,

    // Security settings
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (same-origin only)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "***"),
            )
            .field("default_voice", &self.default_voice)
            .field("default_instructions", &self.default_instructions)
            .field("default_model", &self.default_model)
            .field("upstream_url", &self.upstream_url)
            .field("upstream_timeout_seconds", &self.upstream_timeout_seconds)
            .field("static_dir", &self.static_dir)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field(
                "rate_limit_requests_per_second",
                &self.rate_limit_requests_per_second,
            )
            .field("rate_limit_burst_size", &self.rate_limit_burst_size)
            .finish()
    }
}

/// Zeroize the API key when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and defaults
    ///
    /// The `.env` file is loaded in `main` before this is called, so its values
    /// are visible here as ordinary environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or the merged
    /// configuration fails validation.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate_server_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    ///
    /// # Example
    /// ```rust,no_run
    /// use realtime_voice_relay::config::ServerConfig;
    /// use std::path::PathBuf;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config_path = PathBuf::from("config.yaml");
    /// let config = ServerConfig::from_file(&config_path)?;
    /// println!("Relay listening on {}", config.address());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_server_config(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    ///
    /// Returns true if TLS configuration is present
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Check if a non-blank OpenAI API key is configured
    pub fn has_api_key(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Session defaults for the negotiator
    pub fn negotiator_config(&self) -> NegotiatorConfig {
        NegotiatorConfig {
            api_key: self.openai_api_key.as_deref().map(ApiKey::from),
            default_voice: self.default_voice.clone(),
            default_instructions: self.default_instructions.clone(),
            default_model: self.default_model.clone(),
        }
    }

    /// Upstream endpoint settings for the negotiator
    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            url: self.upstream_url.clone(),
            timeout: Duration::from_secs(self.upstream_timeout_seconds),
            beta_header: REALTIME_BETA_VALUE.to_string(),
        }
    }
}
