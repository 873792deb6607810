//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tablesync_core::RetryPolicy;
use tablesync_types::{JoinMetadata, Player, PlayerId, RoomId};

/// Default time a lost host has to be replaced.
pub const DEFAULT_MIGRATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default capacity of the session event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Configuration of one room membership.
#[derive(Clone)]
pub struct SessionConfig {
    /// Room address; the host listens on it.
    pub room_id: RoomId,
    /// Room password presented at join time.
    pub password: String,
    /// Stable id of this player.
    pub player_id: PlayerId,
    /// Display name of this player.
    pub display_name: String,
    /// How long a lost host has to be replaced before the session fails.
    pub migration_timeout: Duration,
    /// Backoff between rejoin attempts.
    pub retry: RetryPolicy,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Where to keep the resumable snapshot, if anywhere.
    pub cache_path: Option<PathBuf>,
    /// Seed for the reducer rng; entropy when unset.
    pub rng_seed: Option<u64>,
}

impl SessionConfig {
    /// Create a configuration with a fresh random player id.
    pub fn new(
        room_id: impl Into<String>,
        password: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            room_id: RoomId::new(room_id),
            password: password.into(),
            player_id: PlayerId::random(),
            display_name: display_name.into(),
            migration_timeout: DEFAULT_MIGRATION_TIMEOUT,
            retry: RetryPolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            cache_path: None,
            rng_seed: None,
        }
    }

    /// Use an existing player id.
    pub fn with_player_id(mut self, player_id: PlayerId) -> Self {
        self.player_id = player_id;
        self
    }

    /// Set the migration timeout.
    pub fn with_migration_timeout(mut self, timeout: Duration) -> Self {
        self.migration_timeout = timeout;
        self
    }

    /// Set the rejoin backoff.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Keep a resumable snapshot at `path`.
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Seed the reducer rng.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Metadata presented when dialing the host.
    pub fn join_metadata(&self) -> JoinMetadata {
        JoinMetadata {
            password: self.password.clone(),
            display_name: self.display_name.clone(),
            player_id: self.player_id.clone(),
        }
    }

    pub(crate) fn player(&self) -> Player {
        Player::new(self.player_id.clone(), self.display_name.clone())
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("room_id", &self.room_id)
            .field("password", &"[REDACTED]")
            .field("player_id", &self.player_id)
            .field("display_name", &self.display_name)
            .field("migration_timeout", &self.migration_timeout)
            .field("retry", &self.retry)
            .field("event_capacity", &self.event_capacity)
            .field("cache_path", &self.cache_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::new("R1", "pw", "Ann");
        assert_eq!(config.migration_timeout, Duration::from_secs(10));
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert!(config.cache_path.is_none());
        assert_eq!(config.player().life, 20);
    }

    #[test]
    fn join_metadata_carries_identity() {
        let config = SessionConfig::new("R1", "pw", "Ann").with_player_id(PlayerId::new("p1"));
        let meta = config.join_metadata();
        assert_eq!(meta.password, "pw");
        assert_eq!(meta.display_name, "Ann");
        assert_eq!(meta.player_id, PlayerId::new("p1"));
    }

    #[test]
    fn debug_hides_password() {
        let config = SessionConfig::new("R1", "hunter2", "Ann");
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        use rand::Rng;
        let config = SessionConfig::new("R1", "pw", "Ann").with_rng_seed(7);
        let a: u64 = config.rng().gen();
        let b: u64 = config.rng().gen();
        assert_eq!(a, b);
    }
}
