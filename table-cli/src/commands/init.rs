//! Initialize the player identity.

use anyhow::Result;
use std::path::Path;

use crate::config::PlayerConfig;

/// Run the init command.
pub async fn run(data_dir: &Path, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Player name must not be empty");
    }
    if PlayerConfig::exists(data_dir).await {
        anyhow::bail!(
            "Player already initialized. Delete {} to reinitialize.",
            data_dir.join("player.json").display()
        );
    }

    let config = PlayerConfig::new(name.trim());
    config.save(data_dir).await?;

    println!("Player initialized successfully!");
    println!();
    println!("  Player ID: {}", config.player_id);
    println!("  Name:      {}", config.display_name);
    println!("  Data dir:  {}", data_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Open a room:    tablesync-cli host --room <name>");
    println!("  2. Or join a room: tablesync-cli join --room <name>");

    Ok(())
}
