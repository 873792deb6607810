//! Local resumable snapshot.
//!
//! A best-effort cache of the last room this peer was part of, written after
//! state-affecting events and read once at startup to offer "resume". It is
//! never part of the authoritative protocol: a stale or missing cache only
//! means the peer joins from scratch.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tablesync_types::{PlayerId, RoomId, TableState};

use crate::CacheError;

/// What is remembered about the last room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumableSession {
    /// Room address.
    pub room_id: RoomId,
    /// Room password.
    pub password: String,
    /// This peer's stable id.
    pub player_id: PlayerId,
    /// This peer's display name.
    pub display_name: String,
    /// Whether this peer was hosting.
    pub was_host: bool,
    /// Highest host epoch seen.
    pub epoch: u64,
    /// Board, counters, roster and stack positions.
    pub table: TableState,
}

impl ResumableSession {
    /// Write the snapshot atomically (temp file, then rename).
    pub async fn save(&self, path: &Path) -> Result<(), CacheError> {
        let json = serde_json::to_vec_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        // The snapshot carries the room password.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await?;
        }
        tokio::fs::rename(&tmp, path).await?;
        tracing::debug!("Saved resumable session to {}", path.display());
        Ok(())
    }

    /// Read the snapshot; `None` when there is none.
    pub async fn load(path: &Path) -> Result<Option<Self>, CacheError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Forget the snapshot.
    pub async fn clear(path: &Path) -> Result<(), CacheError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
