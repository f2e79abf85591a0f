use std::path::PathBuf;

use super::env::EnvConfig;
use super::utils::non_empty;
use super::validation;
use super::yaml::YamlConfig;
use super::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RATE_LIMIT_BURST_SIZE,
    DEFAULT_RATE_LIMIT_REQUESTS_PER_SECOND, ServerConfig,
};
use crate::core::negotiator::{
    DEFAULT_REALTIME_INSTRUCTIONS, DEFAULT_REALTIME_MODEL, DEFAULT_REALTIME_VOICE,
    DEFAULT_UPSTREAM_TIMEOUT, OPENAI_REALTIME_URL,
};

/// Merge environment variables with optional YAML overrides.
///
/// Priority: YAML > environment > defaults. Empty YAML strings count as
/// absent so that a template file with blank keys does not mask the
/// environment.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let env = EnvConfig::load()?;
    let yaml = yaml.unwrap_or_default();

    let server = yaml.server.unwrap_or_default();
    let tls_yaml = server.tls.unwrap_or_default();
    let realtime = yaml.realtime.unwrap_or_default();
    let ui = yaml.ui.unwrap_or_default();
    let security = yaml.security.unwrap_or_default();

    // Server
    let host = non_empty(server.host)
        .or(env.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.or(env.port).unwrap_or(DEFAULT_PORT);

    // TLS
    let tls_enabled = tls_yaml.enabled.or(env.tls_enabled).unwrap_or(false);
    let tls = if tls_enabled {
        let cert_path = non_empty(tls_yaml.cert_path)
            .map(PathBuf::from)
            .or(env.tls_cert_path);
        let key_path = non_empty(tls_yaml.key_path)
            .map(PathBuf::from)
            .or(env.tls_key_path);
        Some(validation::validate_tls(cert_path, key_path)?)
    } else {
        None
    };

    // Realtime session
    let openai_api_key = non_empty(realtime.api_key).or(env.openai_api_key);
    let default_voice = non_empty(realtime.voice)
        .or(env.voice)
        .unwrap_or_else(|| DEFAULT_REALTIME_VOICE.to_string());
    let default_instructions = non_empty(realtime.instructions)
        .or(env.instructions)
        .unwrap_or_else(|| DEFAULT_REALTIME_INSTRUCTIONS.to_string());
    let default_model = non_empty(realtime.model)
        .or(env.model)
        .unwrap_or_else(|| DEFAULT_REALTIME_MODEL.to_string());
    let upstream_url = non_empty(realtime.upstream_url)
        .or(env.upstream_url)
        .unwrap_or_else(|| OPENAI_REALTIME_URL.to_string());
    let upstream_timeout_seconds = realtime
        .timeout_seconds
        .or(env.timeout_seconds)
        .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT.as_secs());

    // UI
    let static_dir = non_empty(ui.static_dir)
        .map(PathBuf::from)
        .or(env.static_dir);

    // Security
    let cors_allowed_origins = non_empty(security.cors_allowed_origins).or(env.cors_allowed_origins);
    let rate_limit_requests_per_second = security
        .rate_limit_requests_per_second
        .or(env.rate_limit_requests_per_second)
        .unwrap_or(DEFAULT_RATE_LIMIT_REQUESTS_PER_SECOND);
    let rate_limit_burst_size = security
        .rate_limit_burst_size
        .or(env.rate_limit_burst_size)
        .unwrap_or(DEFAULT_RATE_LIMIT_BURST_SIZE);

    Ok(ServerConfig {
        host,
        port,
        tls,
        openai_api_key,
        default_voice,
        default_instructions,
        default_model,
        upstream_url,
        upstream_timeout_seconds,
        static_dir,
        cors_allowed_origins,
        rate_limit_requests_per_second,
        rate_limit_burst_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::yaml::{RealtimeYaml, SecurityYaml, ServerYaml};
    use serial_test::serial;
    use std::env;

    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("HOST");
            env::remove_var("PORT");
            env::remove_var("TLS_ENABLED");
            env::remove_var("TLS_CERT_PATH");
            env::remove_var("TLS_KEY_PATH");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("REALTIME_VOICE");
            env::remove_var("REALTIME_INSTRUCTIONS");
            env::remove_var("REALTIME_MODEL");
            env::remove_var("REALTIME_UPSTREAM_URL");
            env::remove_var("REALTIME_TIMEOUT_SECONDS");
            env::remove_var("STATIC_DIR");
            env::remove_var("CORS_ALLOWED_ORIGINS");
            env::remove_var("RATE_LIMIT_REQUESTS_PER_SECOND");
            env::remove_var("RATE_LIMIT_BURST_SIZE");
        }
    }

    #[test]
    #[serial]
    fn test_merge_defaults() {
        cleanup_env_vars();

        let config = merge_config(None).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert!(config.tls.is_none());
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.default_voice, "marin");
        assert_eq!(config.default_model, "gpt-4o-realtime-preview");
        assert_eq!(config.default_instructions, DEFAULT_REALTIME_INSTRUCTIONS);
        assert_eq!(config.upstream_url, "https://api.openai.com/v1/realtime");
        assert_eq!(config.upstream_timeout_seconds, 20);
        assert!(config.static_dir.is_none());
        assert!(config.cors_allowed_origins.is_none());
        assert_eq!(config.rate_limit_requests_per_second, 60);
        assert_eq!(config.rate_limit_burst_size, 10);
    }

    #[test]
    #[serial]
    fn test_merge_env_only() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "4000");
            env::set_var("OPENAI_API_KEY", "sk-env");
            env::set_var("REALTIME_VOICE", "alloy");
            env::set_var("REALTIME_TIMEOUT_SECONDS", "5");
            env::set_var("STATIC_DIR", "/srv/relay");
        }

        let config = merge_config(None).unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.openai_api_key, Some("sk-env".to_string()));
        assert_eq!(config.default_voice, "alloy");
        assert_eq!(config.upstream_timeout_seconds, 5);
        assert_eq!(config.static_dir, Some(PathBuf::from("/srv/relay")));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_yaml_overrides_env() {
        cleanup_env_vars();
        unsafe {
            env::set_var("HOST", "10.0.0.1");
            env::set_var("OPENAI_API_KEY", "sk-env");
            env::set_var("REALTIME_MODEL", "env-model");
            env::set_var("RATE_LIMIT_BURST_SIZE", "3");
        }

        let yaml = YamlConfig {
            server: Some(ServerYaml {
                host: Some("127.0.0.1".to_string()),
                ..Default::default()
            }),
            realtime: Some(RealtimeYaml {
                api_key: Some("sk-yaml".to_string()),
                ..Default::default()
            }),
            security: Some(SecurityYaml {
                rate_limit_requests_per_second: Some(7),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = merge_config(Some(yaml)).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.openai_api_key, Some("sk-yaml".to_string()));
        // Not set in YAML, so the environment wins
        assert_eq!(config.default_model, "env-model");
        assert_eq!(config.rate_limit_burst_size, 3);
        assert_eq!(config.rate_limit_requests_per_second, 7);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_blank_yaml_does_not_mask_env() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "sk-env");
        }

        let yaml = YamlConfig {
            realtime: Some(RealtimeYaml {
                api_key: Some("".to_string()),
                voice: Some("  ".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = merge_config(Some(yaml)).unwrap();

        assert_eq!(config.openai_api_key, Some("sk-env".to_string()));
        assert_eq!(config.default_voice, "marin");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_invalid_env_value() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let result = merge_config(None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PORT"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_tls_enabled_without_paths() {
        cleanup_env_vars();
        unsafe {
            env::set_var("TLS_ENABLED", "true");
        }

        let result = merge_config(None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("TLS_CERT_PATH"));

        cleanup_env_vars();
    }
}
