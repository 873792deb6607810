//! Room harness: spawns sessions on a shared in-memory network.

use std::sync::Arc;
use std::time::Duration;

use tablesync_peer::{
    MemoryNetwork, MemoryTransport, ResumableSession, RetryPolicy, Role, Session, SessionConfig,
    SessionError, SessionHandle, SessionView, Transport,
};
use tablesync_types::PlayerId;
use thiserror::Error;

/// How long any single wait may take before the scenario fails.
pub const WAIT: Duration = Duration::from_secs(5);

/// Errors that can occur while driving a scenario.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A condition was not reached in time.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// The session task ended.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// No peer with this id was spawned.
    #[error("unknown peer {0}")]
    UnknownPeer(String),
}

/// One participant of the room.
pub struct Peer {
    /// Player id.
    pub id: PlayerId,
    /// The peer's endpoint on the shared network.
    pub transport: Arc<MemoryTransport>,
    /// Handle to the peer's session task.
    pub session: SessionHandle,
}

/// A room on an in-memory network.
///
/// Peers get fast retries so migrations settle well within [`WAIT`].
pub struct RoomHarness {
    network: MemoryNetwork,
    room: String,
    password: String,
    migration_timeout: Duration,
    peers: Vec<Peer>,
}

impl RoomHarness {
    /// Create a harness for `room` guarded by `password`.
    pub fn new(room: &str, password: &str) -> Self {
        Self {
            network: MemoryNetwork::new(),
            room: room.to_string(),
            password: password.to_string(),
            migration_timeout: Duration::from_secs(3),
            peers: Vec::new(),
        }
    }

    /// Override the migration timeout of peers spawned afterwards.
    pub fn with_migration_timeout(mut self, timeout: Duration) -> Self {
        self.migration_timeout = timeout;
        self
    }

    /// The shared network.
    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }

    /// Session config for player `id` using `password`.
    pub fn config(&self, id: &str, password: &str) -> SessionConfig {
        SessionConfig::new(self.room.as_str(), password, id.to_uppercase())
            .with_player_id(PlayerId::new(id))
            .with_retry(RetryPolicy::fixed(
                Duration::from_millis(20),
                Duration::from_millis(100),
            ))
            .with_migration_timeout(self.migration_timeout)
            .with_rng_seed(self.peers.len() as u64 + 1)
    }

    /// Open the room as `id` and wait until it serves.
    pub async fn host(&mut self, id: &str) -> Result<SessionHandle, HarnessError> {
        let config = self.config(id, &self.password);
        let session = self.spawn(id, |transport| Session::host(transport, config));
        wait_for(&session, "room to open", |v| v.role == Some(Role::Host)).await?;
        Ok(session)
    }

    /// Join as `id` and wait for the first snapshot.
    pub async fn join(&mut self, id: &str) -> Result<SessionHandle, HarnessError> {
        let config = self.config(id, &self.password);
        let session = self.spawn(id, |transport| Session::join(transport, config));
        let me = PlayerId::new(id);
        wait_for(&session, "first snapshot", |v| {
            v.role == Some(Role::Client) && v.table.players.iter().any(|p| p.id == me)
        })
        .await?;
        Ok(session)
    }

    /// Start joining as `id` with an arbitrary password, without waiting.
    pub fn join_with_password(&mut self, id: &str, password: &str) -> SessionHandle {
        let config = self.config(id, password);
        self.spawn(id, |transport| Session::join(transport, config))
    }

    /// Resume a cached membership as `id`, without waiting.
    pub fn resume(&mut self, id: &str, cached: ResumableSession) -> SessionHandle {
        let config = self.config(id, &cached.password);
        self.spawn(id, |transport| Session::resume(transport, config, cached))
    }

    /// Look up a spawned peer.
    pub fn peer(&self, id: &str) -> Result<&Peer, HarnessError> {
        self.peers
            .iter()
            .rev()
            .find(|p| p.id.as_str() == id)
            .ok_or_else(|| HarnessError::UnknownPeer(id.to_string()))
    }

    /// Kill `id`'s endpoint without a goodbye.
    pub async fn crash(&self, id: &str) -> Result<(), HarnessError> {
        let peer = self.peer(id)?;
        tracing::debug!("Crashing peer {}", id);
        peer.transport.shutdown().await;
        Ok(())
    }

    /// Current views of every peer, in spawn order.
    pub fn views(&self) -> Vec<SessionView> {
        self.peers.iter().map(|p| p.session.view()).collect()
    }

    fn spawn(
        &mut self,
        id: &str,
        start: impl FnOnce(Arc<MemoryTransport>) -> SessionHandle,
    ) -> SessionHandle {
        let transport = Arc::new(self.network.endpoint());
        let session = start(Arc::clone(&transport));
        self.peers.push(Peer {
            id: PlayerId::new(id),
            transport,
            session: session.clone(),
        });
        session
    }
}

/// Wait until `session`'s view satisfies `predicate`, at most [`WAIT`].
pub async fn wait_for(
    session: &SessionHandle,
    what: &'static str,
    predicate: impl FnMut(&SessionView) -> bool,
) -> Result<SessionView, HarnessError> {
    match tokio::time::timeout(WAIT, session.wait_until(predicate)).await {
        Ok(view) => Ok(view?),
        Err(_) => Err(HarnessError::Timeout(what)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn host_and_join() {
        let mut room = RoomHarness::new("R1", "pw");
        room.host("host").await.unwrap();
        room.join("alice").await.unwrap();
        assert_eq!(room.views().len(), 2);
        assert!(room.network().is_listening("R1"));
    }

    #[tokio::test]
    async fn unknown_peer_is_an_error() {
        let room = RoomHarness::new("R1", "pw");
        assert!(matches!(
            room.crash("ghost").await,
            Err(HarnessError::UnknownPeer(_))
        ));
    }

    #[tokio::test]
    async fn timeout_names_the_condition() {
        let mut room = RoomHarness::new("R1", "pw");
        let host = room.host("host").await.unwrap();
        let err = tokio::time::timeout(
            WAIT * 2,
            wait_for(&host, "impossible", |v| v.epoch == 99),
        )
        .await
        .unwrap()
        .unwrap_err();
        assert_eq!(err.to_string(), "timed out waiting for impossible");
    }
}
