//! tablesync-relay binary entry point.
//!
//! Usage:
//! ```bash
//! tablesync-relay --config relay.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tablesync_relay::{serve, Config, Relay};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = get_config_path();
    let config = if path.exists() {
        Config::from_file(&path)?
    } else {
        tracing::info!("No config at {}, using defaults", path.display());
        Config::default()
    };

    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;
    tracing::info!("tablesync-relay v{}", env!("CARGO_PKG_VERSION"));

    let relay = Arc::new(Relay::new(config));
    tokio::select! {
        result = serve(Arc::clone(&relay), listener) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down: {:?}", relay.metrics());
        }
    }
    Ok(())
}

fn get_config_path() -> PathBuf {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("relay.toml"))
}
