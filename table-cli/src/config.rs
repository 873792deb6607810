//! Configuration management for tablesync-cli.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tablesync_types::PlayerId;

const PLAYER_FILE: &str = "player.json";
const SESSION_FILE: &str = "session.json";

/// Player identity stored locally.
///
/// The id is kept across runs so a restarted peer is recognised as the same
/// player when it rejoins a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Stable player identifier.
    pub player_id: PlayerId,
    /// Name shown to the other players.
    pub display_name: String,
    /// When the identity was created (seconds since the epoch).
    pub created_at: u64,
}

impl PlayerConfig {
    /// Create a new player identity.
    pub fn new(name: &str) -> Self {
        Self {
            player_id: PlayerId::random(),
            display_name: name.to_string(),
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        }
    }

    /// Load the player identity from a directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(PLAYER_FILE);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Player not initialized. Run 'tablesync-cli init' first.")?;
        serde_json::from_str(&contents).context("Invalid player configuration")
    }

    /// Save the player identity to a directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join(PLAYER_FILE);
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save player configuration")?;
        set_file_permissions_0600(&path).await?;
        Ok(())
    }

    /// Check if a player identity exists.
    pub async fn exists(data_dir: &Path) -> bool {
        tokio::fs::try_exists(data_dir.join(PLAYER_FILE))
            .await
            .unwrap_or(false)
    }
}

/// Where the resumable session snapshot lives.
pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE)
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
