//! uplink-server - reference verifying endpoint

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use uplink_core::{CredentialProvider, HeaderFileProvider, DEFAULT_CREDENTIALS_PATH, DEFAULT_KEY_NAME};
use uplink_server::VerifyingServer;

/// Verify and acknowledge signed uplink commands
#[derive(Parser, Debug)]
#[command(name = "uplink-server", version)]
struct Args {
    /// Bind address
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Header file holding the shared key
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CREDENTIALS_PATH)]
    credentials: PathBuf,

    /// Name of the constant the key is defined under
    #[arg(long, default_value = DEFAULT_KEY_NAME)]
    key_name: String,

    /// Accepted clock skew in milliseconds, either direction
    #[arg(long, default_value_t = 30_000)]
    window_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting uplink-server");
    info!("Credentials: {} ({})", args.credentials.display(), args.key_name);
    info!("Freshness window: {}ms", args.window_ms);

    let key = HeaderFileProvider::new(&args.credentials, &args.key_name)
        .load_key()
        .context("failed to load shared key")?;

    let server = VerifyingServer::new(key, Duration::from_millis(args.window_ms));

    match server.serve(args.bind).await {
        Ok(()) => info!("Server shutdown gracefully"),
        Err(e) => {
            warn!("Server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
