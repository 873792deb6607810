//! Admission scenarios.

#[cfg(test)]
mod tests {
    use crate::assertions::{assert_converged, assert_single_host, require};
    use crate::harness::{wait_for, RoomHarness};
    use tablesync_peer::{ConnectionState, SessionEvent, INVALID_PASSWORD};
    use tablesync_types::PlayerId;

    /// A joiner receives the host's empty board and a two-entry roster.
    #[tokio::test]
    async fn joiner_receives_room_state() {
        let mut room = RoomHarness::new("R1", "pw");
        room.host("host").await.unwrap();
        let alice = room.join("alice").await.unwrap();

        let view = alice.view();
        assert!(view.table.board.is_empty());
        let ids: Vec<&str> = view.table.players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["host", "alice"]);
        assert_eq!(view.host_id(), Some(&PlayerId::new("host")));

        require(&[assert_single_host(&room.views()), assert_converged(&room.views())]);
    }

    /// A wrong password ends the joiner in an error and leaves the roster alone.
    #[tokio::test]
    async fn wrong_password_is_refused() {
        let mut room = RoomHarness::new("R1", "pw");
        let host = room.host("host").await.unwrap();
        let mut events = host.subscribe();

        let mallory = room.join_with_password("mallory", "letmein");
        let view = wait_for(&mallory, "refusal", |v| {
            matches!(v.state, ConnectionState::Error { .. })
        })
        .await
        .unwrap();
        assert_eq!(
            view.state,
            ConnectionState::Error {
                message: INVALID_PASSWORD.into()
            }
        );
        assert_eq!(host.view().table.players.len(), 1);

        let event = tokio::time::timeout(crate::harness::WAIT, events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            SessionEvent::PeerRejected {
                player_id: Some(PlayerId::new("mallory"))
            }
        );
    }

    /// Several joiners all see the same roster in join order.
    #[tokio::test]
    async fn roster_keeps_join_order() {
        let mut room = RoomHarness::new("R1", "pw");
        room.host("host").await.unwrap();
        room.join("alice").await.unwrap();
        room.join("bob").await.unwrap();
        let carol = room.join("carol").await.unwrap();

        let view = carol.view();
        let ids: Vec<&str> = view.table.players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["host", "alice", "bob", "carol"]);

        for peer in ["alice", "bob"] {
            let session = &room.peer(peer).unwrap().session;
            wait_for(session, "full roster", |v| v.table.players.len() == 4)
                .await
                .unwrap();
        }
        require(&[assert_converged(&room.views())]);
    }

    /// A vanished client leaves the roster and comes back at its end.
    #[tokio::test]
    async fn vanished_client_rejoins_at_the_end() {
        let mut room = RoomHarness::new("R1", "pw");
        let host = room.host("host").await.unwrap();
        room.join("alice").await.unwrap();
        let bob = room.join("bob").await.unwrap();
        wait_for(&host, "three players", |v| v.table.players.len() == 3)
            .await
            .unwrap();

        room.crash("alice").await.unwrap();
        wait_for(&bob, "alice gone", |v| v.table.players.len() == 2)
            .await
            .unwrap();

        let alice = room.join("alice").await.unwrap();
        let view = alice.view();
        let ids: Vec<&str> = view.table.players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["host", "bob", "alice"]);
    }
}
