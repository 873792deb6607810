//! # tablesync-cli
//!
//! Terminal client for tablesync rooms.
//!
//! ## Commands
//!
//! - `init`: Create the local player identity
//! - `host`: Open a room and host it
//! - `join`: Join an existing room
//! - `resume`: Rejoin the room saved by the last session
//! - `status`: Show the identity and the saved session
//!
//! ## Example
//!
//! ```bash
//! # Start a relay somewhere both players can reach
//! tablesync-relay --config relay.toml
//!
//! # Create an identity
//! tablesync-cli init --name "Alice"
//!
//! # Open a room (prompts for the password)
//! tablesync-cli host --room friday-night
//!
//! # On another machine
//! tablesync-cli --relay 10.0.0.5:4480 join --room friday-night
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{init, room, status};

/// Terminal client for tablesync rooms.
#[derive(Parser, Debug)]
#[command(name = "tablesync-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the player identity and the saved session
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Relay address
    #[arg(long, global = true, default_value = "127.0.0.1:4480")]
    relay: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the local player identity
    Init {
        /// Display name
        #[arg(long, short)]
        name: String,
    },

    /// Open a room and host it
    Host {
        /// Room name
        #[arg(long, short)]
        room: String,

        /// Room password (will prompt if not provided)
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Join an existing room
    Join {
        /// Room name
        #[arg(long, short)]
        room: String,

        /// Room password (will prompt if not provided)
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Rejoin the room saved by the last session
    Resume,

    /// Show the identity and the saved session
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they do not interleave with the table.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    match cli.command {
        Commands::Init { name } => {
            init::run(&data_dir, &name).await?;
        }
        Commands::Host { room: name, password } => {
            room::host(&data_dir, &cli.relay, &name, password.as_deref()).await?;
        }
        Commands::Join { room: name, password } => {
            room::join(&data_dir, &cli.relay, &name, password.as_deref()).await?;
        }
        Commands::Resume => {
            room::resume(&data_dir, &cli.relay).await?;
        }
        Commands::Status => {
            status::run(&data_dir).await?;
        }
    }

    Ok(())
}

/// Get the default data directory for tablesync-cli.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "tablesync", "tablesync-cli")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn relay_defaults_to_loopback() {
        let cli = Cli::parse_from(["tablesync-cli", "status"]);
        assert_eq!(cli.relay, "127.0.0.1:4480");
        assert!(cli.data_dir.is_none());
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from([
            "tablesync-cli",
            "join",
            "--room",
            "R1",
            "--relay",
            "10.0.0.5:4480",
            "-p",
            "pw",
        ]);
        assert_eq!(cli.relay, "10.0.0.5:4480");
        match cli.command {
            Commands::Join { room, password } => {
                assert_eq!(room, "R1");
                assert_eq!(password.as_deref(), Some("pw"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
