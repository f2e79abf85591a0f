use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use realtime_voice_relay::{ServerConfig, VoiceServer};

/// Realtime voice relay - SDP signaling for browser voice sessions
#[derive(Parser, Debug)]
#[command(name = "realtime-voice-relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        println!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    if config.has_api_key() {
        info!("OpenAI API key: Loaded");
    } else {
        warn!("OpenAI API key: Missing - session requests will fail until one is configured");
    }
    println!("Starting relay on {}", config.address());

    let server = VoiceServer::start(config).await?;
    println!("Relay ready at {}", server.url());

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow!("Failed to listen for shutdown signal: {}", e))?;

    println!("Shutting down...");
    server.stop().await?;

    Ok(())
}
