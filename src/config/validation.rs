//! Configuration validation
//!
//! Checks run once, after env and YAML values have been merged. Every failure
//! is reported with the setting name so the operator knows what to fix.

use std::path::PathBuf;
use tracing::warn;
use url::{Host, Url};

use super::{ServerConfig, TlsConfig};

/// Accepted range for `REALTIME_TIMEOUT_SECONDS`.
pub(super) const MIN_TIMEOUT_SECONDS: u64 = 1;
pub(super) const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Run every check against a merged configuration.
pub(super) fn validate_server_config(
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    validate_upstream_url(&config.upstream_url)?;
    validate_timeout(config.upstream_timeout_seconds)?;
    validate_instructions(&config.default_instructions)?;
    validate_rate_limit(
        config.rate_limit_requests_per_second,
        config.rate_limit_burst_size,
    )?;
    Ok(())
}

/// Build the TLS settings once TLS has been switched on.
///
/// Both paths must be configured and must point at existing files.
pub(super) fn validate_tls(
    cert_path: Option<PathBuf>,
    key_path: Option<PathBuf>,
) -> Result<TlsConfig, Box<dyn std::error::Error>> {
    let cert_path =
        cert_path.ok_or("TLS is enabled but TLS_CERT_PATH (server.tls.cert_path) is not set")?;
    let key_path =
        key_path.ok_or("TLS is enabled but TLS_KEY_PATH (server.tls.key_path) is not set")?;

    if !cert_path.is_file() {
        return Err(format!("TLS certificate not found: {}", cert_path.display()).into());
    }
    if !key_path.is_file() {
        return Err(format!("TLS private key not found: {}", key_path.display()).into());
    }

    Ok(TlsConfig {
        cert_path,
        key_path,
    })
}

/// The upstream endpoint must be an absolute http(s) URL with a host.
///
/// Plain HTTP is accepted so that a local stub can stand in for the real
/// API, but it is logged unless the host is loopback.
pub(super) fn validate_upstream_url(raw: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse(raw).map_err(|e| format!("Invalid REALTIME_UPSTREAM_URL '{raw}': {e}"))?;

    match url.scheme() {
        "https" => {}
        "http" => {
            if !is_loopback_host(&url) {
                warn!(
                    "REALTIME_UPSTREAM_URL uses plain HTTP; the API key will be sent unencrypted to {}",
                    url.host_str().unwrap_or_default()
                );
            }
        }
        other => {
            return Err(format!(
                "REALTIME_UPSTREAM_URL must use http or https, got '{other}'"
            )
            .into());
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(format!("REALTIME_UPSTREAM_URL must have a host: '{raw}'").into());
    }

    Ok(())
}

fn is_loopback_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

pub(super) fn validate_timeout(seconds: u64) -> Result<(), Box<dyn std::error::Error>> {
    if !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&seconds) {
        return Err(format!(
            "REALTIME_TIMEOUT_SECONDS must be between {MIN_TIMEOUT_SECONDS} and {MAX_TIMEOUT_SECONDS}, got {seconds}"
        )
        .into());
    }
    Ok(())
}

pub(super) fn validate_instructions(instructions: &str) -> Result<(), Box<dyn std::error::Error>> {
    if instructions.trim().is_empty() {
        return Err("REALTIME_INSTRUCTIONS must not be empty".into());
    }
    Ok(())
}

/// Both limits must be non-zero; governor cannot build a quota from zero.
pub(super) fn validate_rate_limit(
    requests_per_second: u32,
    burst_size: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if requests_per_second == 0 {
        return Err("RATE_LIMIT_REQUESTS_PER_SECOND must be greater than 0".into());
    }
    if burst_size == 0 {
        return Err("RATE_LIMIT_BURST_SIZE must be greater than 0".into());
    }
    Ok(())
}
