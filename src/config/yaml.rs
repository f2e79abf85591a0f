use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// This structure represents the full configuration that can be loaded from a YAML file.
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///   tls:
///     enabled: true
///     cert_path: "/etc/relay/cert.pem"
///     key_path: "/etc/relay/key.pem"
///
/// realtime:
///   api_key: "sk-..."
///   voice: "marin"
///   model: "gpt-4o-realtime-preview"
///   instructions: "You are a helpful assistant."
///   upstream_url: "https://api.openai.com/v1/realtime"
///   timeout_seconds: 20
///
/// ui:
///   static_dir: "./public"
///
/// security:
///   cors_allowed_origins: "https://example.com"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub realtime: Option<RealtimeYaml>,
    pub ui: Option<UiYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Realtime session settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RealtimeYaml {
    /// OpenAI API key used for the SDP exchange
    pub api_key: Option<String>,
    /// Default voice when the browser does not pick one
    pub voice: Option<String>,
    /// Default model when the browser does not pick one
    pub model: Option<String>,
    /// System instructions sent with every session
    pub instructions: Option<String>,
    /// Upstream negotiation endpoint
    pub upstream_url: Option<String>,
    /// Bound on one upstream exchange
    pub timeout_seconds: Option<u64>,
}

/// Browser UI hosting from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct UiYaml {
    /// Directory served at `/`, with `index.html` as fallback
    pub static_dir: Option<String>,
}

/// Security configuration from YAML
///
/// # Example YAML structure
/// ```yaml
/// security:
///   cors_allowed_origins: "https://example.com,https://app.example.com"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    pub rate_limit_requests_per_second: Option<u32>,
    /// Maximum burst size for rate limiting
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    /// * `Result<YamlConfig, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
