use std::path::PathBuf;

use super::utils::{env_bool, env_var, parse_env};

/// Raw values read from the process environment.
///
/// Nothing here is defaulted; `merge` decides what an absent value means.
#[derive(Debug, Default)]
pub(super) struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,

    pub tls_enabled: Option<bool>,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,

    pub openai_api_key: Option<String>,
    pub voice: Option<String>,
    pub instructions: Option<String>,
    pub model: Option<String>,
    pub upstream_url: Option<String>,
    pub timeout_seconds: Option<u64>,

    pub static_dir: Option<PathBuf>,

    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
}

impl EnvConfig {
    /// Read every recognised variable.
    ///
    /// Fails only when a variable is set to something that does not parse,
    /// for example `PORT=abc`.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            host: env_var("HOST"),
            port: parse_env("PORT")?,

            tls_enabled: env_bool("TLS_ENABLED")?,
            tls_cert_path: env_var("TLS_CERT_PATH").map(PathBuf::from),
            tls_key_path: env_var("TLS_KEY_PATH").map(PathBuf::from),

            openai_api_key: env_var("OPENAI_API_KEY"),
            voice: env_var("REALTIME_VOICE"),
            instructions: env_var("REALTIME_INSTRUCTIONS"),
            model: env_var("REALTIME_MODEL"),
            upstream_url: env_var("REALTIME_UPSTREAM_URL"),
            timeout_seconds: parse_env("REALTIME_TIMEOUT_SECONDS")?,

            static_dir: env_var("STATIC_DIR").map(PathBuf::from),

            cors_allowed_origins: env_var("CORS_ALLOWED_ORIGINS"),
            rate_limit_requests_per_second: parse_env("RATE_LIMIT_REQUESTS_PER_SECOND")?,
            rate_limit_burst_size: parse_env("RATE_LIMIT_BURST_SIZE")?,
        })
    }
}
