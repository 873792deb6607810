//! Show the local player identity and the saved session.

use anyhow::Result;
use std::path::Path;
use tablesync_peer::ResumableSession;

use crate::config::{session_path, PlayerConfig};

/// Run the status command.
pub async fn run(data_dir: &Path) -> Result<()> {
    println!("=== tablesync-cli status ===");
    println!();

    match PlayerConfig::load(data_dir).await {
        Ok(player) => {
            println!("Player:");
            println!("  ID:   {}", player.player_id);
            println!("  Name: {}", player.display_name);
        }
        Err(_) => {
            println!("Player: NOT INITIALIZED");
            println!();
            println!("Run 'tablesync-cli init --name <name>' to initialize.");
            return Ok(());
        }
    }

    println!();

    match ResumableSession::load(&session_path(data_dir)).await {
        Ok(Some(saved)) => {
            println!("Saved session:");
            println!("  Room:    {}", saved.room_id);
            println!("  Role:    {}", if saved.was_host { "host" } else { "client" });
            println!("  Epoch:   {}", saved.epoch);
            println!("  Players: {}", saved.table.players.len());
            println!("  Cards:   {}", saved.table.board.len());
            println!();
            println!("Run 'tablesync-cli resume' to rejoin.");
        }
        Ok(None) => println!("Saved session: none"),
        Err(e) => println!("Saved session: unreadable ({})", e),
    }

    Ok(())
}
