//! Host migration scenarios.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::assertions::{assert_converged, assert_single_host, require};
    use crate::harness::{wait_for, RoomHarness};
    use tablesync_peer::{ConnectionState, Role, SessionEvent};
    use tablesync_types::{Action, Card, CardId, PlayerId, Position, Zone};

    fn card(id: &str, owner: &str) -> Card {
        Card::new(
            CardId::new(id),
            id,
            PlayerId::new(owner),
            Zone::Battlefield,
            Position::new(3.0, 4.0),
        )
    }

    /// The first peer of the roster takes over after a crash and the other
    /// peer reconnects to it with the pre-failure board.
    #[tokio::test]
    async fn crashed_host_is_replaced() {
        let mut room = RoomHarness::new("R1", "pw");
        room.host("host").await.unwrap();
        let alice = room.join("alice").await.unwrap();
        let bob = room.join("bob").await.unwrap();
        alice
            .request(Action::Add {
                card: card("c1", "alice"),
            })
            .await
            .unwrap();
        bob.request(Action::Add {
            card: card("c2", "bob"),
        })
        .await
        .unwrap();
        let before = wait_for(&bob, "both cards", |v| {
            v.table.board.len() == 2 && v.table.players.len() == 3
        })
        .await
        .unwrap();

        room.crash("host").await.unwrap();

        let view = wait_for(&alice, "alice hosting", |v| v.role == Some(Role::Host))
            .await
            .unwrap();
        assert_eq!(view.epoch, 1);
        let view = wait_for(&bob, "bob reconnected", |v| {
            v.role == Some(Role::Client) && v.epoch == 1
        })
        .await
        .unwrap();
        assert_eq!(view.table.board, before.table.board);
        assert_eq!(view.host_id(), Some(&PlayerId::new("alice")));
        assert!(room.network().is_listening("R1"));

        // The new host keeps serving requests.
        bob.request(Action::ToggleTap {
            id: CardId::new("c1"),
        })
        .await
        .unwrap();
        wait_for(&alice, "tap applied", |v| {
            v.table.card(&CardId::new("c1")).is_some_and(|c| c.tapped)
        })
        .await
        .unwrap();
        wait_for(&bob, "tap mirrored", |v| {
            v.table.card(&CardId::new("c1")).is_some_and(|c| c.tapped)
        })
        .await
        .unwrap();

        let live = [alice.view(), bob.view()];
        require(&[assert_single_host(&live), assert_converged(&live)]);
    }

    /// The crashed host drops out of the roster once the room settles.
    #[tokio::test]
    async fn crashed_host_leaves_the_roster() {
        let mut room =
            RoomHarness::new("R1", "pw").with_migration_timeout(Duration::from_millis(500));
        room.host("host").await.unwrap();
        room.join("alice").await.unwrap();
        let bob = room.join("bob").await.unwrap();
        wait_for(&bob, "full roster", |v| v.table.players.len() == 3)
            .await
            .unwrap();

        room.crash("host").await.unwrap();

        let view = wait_for(&bob, "host pruned", |v| {
            v.epoch == 1 && v.table.players.iter().all(|p| p.id.as_str() != "host")
        })
        .await
        .unwrap();
        let ids: Vec<&str> = view.table.players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
    }

    /// Leaving hands the room to the next player, who serves at a new epoch.
    #[tokio::test]
    async fn voluntary_handover() {
        let mut room = RoomHarness::new("R1", "pw");
        let host = room.host("host").await.unwrap();
        let alice = room.join("alice").await.unwrap();
        let bob = room.join("bob").await.unwrap();
        let mut bob_events = bob.subscribe();
        host.request(Action::Add {
            card: card("c1", "host"),
        })
        .await
        .unwrap();
        wait_for(&bob, "card and roster", |v| {
            v.table.board.len() == 1 && v.table.players.len() == 3
        })
        .await
        .unwrap();

        host.leave().await.unwrap();

        let view = wait_for(&alice, "alice hosting", |v| v.role == Some(Role::Host))
            .await
            .unwrap();
        assert_eq!(view.epoch, 1);
        assert_eq!(view.table.board.len(), 1);
        let view = wait_for(&bob, "bob following", |v| {
            v.role == Some(Role::Client) && v.epoch == 1
        })
        .await
        .unwrap();
        let ids: Vec<&str> = view.table.players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
        assert_eq!(host.view().state, ConnectionState::Idle);

        let mut saw_handover = false;
        while let Ok(event) = bob_events.try_recv() {
            saw_handover |= event
                == SessionEvent::HandoverStarted {
                    new_host: PlayerId::new("alice"),
                };
        }
        assert!(saw_handover);
    }

    /// Two crashes in a row: each time the head of the roster takes over.
    #[tokio::test]
    async fn successive_crashes() {
        let mut room = RoomHarness::new("R1", "pw");
        room.host("host").await.unwrap();
        room.join("alice").await.unwrap();
        room.join("bob").await.unwrap();
        let carol = room.join("carol").await.unwrap();
        carol
            .request(Action::Add {
                card: card("c1", "carol"),
            })
            .await
            .unwrap();
        wait_for(&carol, "roster and card", |v| {
            v.table.players.len() == 4 && v.table.board.len() == 1
        })
        .await
        .unwrap();

        room.crash("host").await.unwrap();
        let bob = room.peer("bob").unwrap().session.clone();
        wait_for(&bob, "first migration", |v| {
            v.role == Some(Role::Client) && v.epoch == 1
        })
        .await
        .unwrap();
        wait_for(&carol, "first migration", |v| {
            v.role == Some(Role::Client) && v.epoch == 1
        })
        .await
        .unwrap();

        room.crash("alice").await.unwrap();
        let view = wait_for(&bob, "bob hosting", |v| v.role == Some(Role::Host))
            .await
            .unwrap();
        assert_eq!(view.epoch, 2);
        let view = wait_for(&carol, "second migration", |v| {
            v.role == Some(Role::Client) && v.epoch == 2
        })
        .await
        .unwrap();
        assert_eq!(view.host_id(), Some(&PlayerId::new("bob")));
        assert_eq!(view.table.board.len(), 1);
    }

    /// With nobody to take over, the last peer gives up after the timeout.
    #[tokio::test]
    async fn lone_survivor_gives_up() {
        let mut room =
            RoomHarness::new("R1", "pw").with_migration_timeout(Duration::from_millis(300));
        room.host("host").await.unwrap();
        let alice = room.join("alice").await.unwrap();

        room.crash("host").await.unwrap();

        let view = wait_for(&alice, "migration timeout", |v| {
            matches!(v.state, ConnectionState::Error { .. })
        })
        .await
        .unwrap();
        assert_eq!(
            view.state,
            ConnectionState::Error {
                message: "host migration timed out".into()
            }
        );
    }
}
