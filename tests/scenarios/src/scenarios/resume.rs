//! Resume scenarios.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::harness::{wait_for, RoomHarness, WAIT};
    use tablesync_peer::{ResumableSession, Role, Session, Transport};
    use tablesync_types::{Action, Card, CardId, PlayerId, Position, Zone};
    use tempfile::tempdir;

    fn card(id: &str, owner: &str) -> Card {
        Card::new(
            CardId::new(id),
            id,
            PlayerId::new(owner),
            Zone::Battlefield,
            Position::new(1.0, 1.0),
        )
    }

    /// Poll the snapshot file until it holds `cards` cards; it is written
    /// just after the view is published.
    async fn snapshot_with(path: &Path, cards: usize) -> ResumableSession {
        tokio::time::timeout(WAIT, async {
            loop {
                if let Ok(Some(cached)) = ResumableSession::load(path).await {
                    if cached.table.board.len() == cards {
                        return cached;
                    }
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("snapshot never written")
    }

    /// A host restarted from its snapshot reopens the room one epoch later,
    /// with the board it had.
    #[tokio::test]
    async fn restarted_host_reopens_its_room() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut room = RoomHarness::new("R1", "pw");

        let config = room.config("host", "pw").with_cache_path(&path);
        let transport = Arc::new(room.network().endpoint());
        let first = Session::host(Arc::clone(&transport), config);
        wait_for(&first, "room open", |v| v.role == Some(Role::Host))
            .await
            .unwrap();
        first
            .request(Action::Add {
                card: card("c1", "host"),
            })
            .await
            .unwrap();
        wait_for(&first, "card", |v| v.table.board.len() == 1)
            .await
            .unwrap();

        // The snapshot outlives the crashed process.
        let cached = snapshot_with(&path, 1).await;
        assert!(cached.was_host);
        transport.shutdown().await;
        assert!(!room.network().is_listening("R1"));

        let resumed = room.resume("host", cached);
        let view = wait_for(&resumed, "room reopened", |v| v.role == Some(Role::Host))
            .await
            .unwrap();
        assert_eq!(view.epoch, 1);
        assert_eq!(view.table.board, vec![card("c1", "host")]);

        let alice = room.join("alice").await.unwrap();
        assert_eq!(alice.view().table.board.len(), 1);
    }

    /// A client restarted from its snapshot rejoins the running room.
    #[tokio::test]
    async fn restarted_client_rejoins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut room = RoomHarness::new("R1", "pw");
        let host = room.host("host").await.unwrap();

        let config = room.config("alice", "pw").with_cache_path(&path);
        let transport = Arc::new(room.network().endpoint());
        let alice = Session::join(Arc::clone(&transport), config);
        wait_for(&alice, "joined", |v| v.table.players.len() == 2)
            .await
            .unwrap();
        host.request(Action::Add {
            card: card("c1", "host"),
        })
        .await
        .unwrap();
        wait_for(&alice, "card", |v| v.table.board.len() == 1)
            .await
            .unwrap();

        let cached = snapshot_with(&path, 1).await;
        assert!(!cached.was_host);
        transport.shutdown().await;
        wait_for(&host, "alice gone", |v| v.table.players.len() == 1)
            .await
            .unwrap();

        let again = room.resume("alice", cached);
        let view = wait_for(&again, "rejoined", |v| {
            v.role == Some(Role::Client) && v.table.players.len() == 2
        })
        .await
        .unwrap();
        assert_eq!(view.host_id(), Some(&PlayerId::new("host")));
        assert_eq!(view.table.board.len(), 1);
    }

    /// Dropping every handle stops the session without forgetting the room.
    #[tokio::test]
    async fn dropped_session_can_be_resumed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut room = RoomHarness::new("R1", "pw");
        let host = room.host("host").await.unwrap();

        let config = room.config("alice", "pw").with_cache_path(&path);
        let alice = Session::join(Arc::new(room.network().endpoint()), config);
        wait_for(&alice, "joined", |v| v.table.players.len() == 2)
            .await
            .unwrap();
        host.request(Action::Add {
            card: card("c1", "host"),
        })
        .await
        .unwrap();
        snapshot_with(&path, 1).await;

        drop(alice);
        wait_for(&host, "alice gone", |v| v.table.players.len() == 1)
            .await
            .unwrap();

        let cached = ResumableSession::load(&path)
            .await
            .unwrap()
            .expect("snapshot kept after the session stopped");
        let again = room.resume("alice", cached);
        let view = wait_for(&again, "rejoined", |v| {
            v.role == Some(Role::Client) && v.table.players.len() == 2
        })
        .await
        .unwrap();
        assert_eq!(view.table.board.len(), 1);
    }
}
