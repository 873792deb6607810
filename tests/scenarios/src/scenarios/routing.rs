//! Request routing scenarios.

#[cfg(test)]
mod tests {
    use crate::assertions::{
        assert_converged, assert_ordering_consistent, assert_unique_ids, require,
    };
    use crate::harness::{wait_for, RoomHarness};
    use tablesync_peer::SessionError;
    use tablesync_types::{Action, Card, CardId, PlayerId, Position, Zone};

    fn card(id: &str, owner: &str, zone: Zone) -> Card {
        Card::new(
            CardId::new(id),
            id,
            PlayerId::new(owner),
            zone,
            Position::new(120.0, 80.0),
        )
    }

    /// A client's `add` lands on every mirror at the position it sent.
    #[tokio::test]
    async fn client_add_reaches_every_mirror() {
        let mut room = RoomHarness::new("R1", "pw");
        let host = room.host("host").await.unwrap();
        let alice = room.join("alice").await.unwrap();
        let bob = room.join("bob").await.unwrap();

        let sent = card("c1", "alice", Zone::Battlefield);
        alice
            .request(Action::Add { card: sent.clone() })
            .await
            .unwrap();

        for session in [&host, &alice, &bob] {
            let view = wait_for(session, "card on board", |v| v.table.board.len() == 1)
                .await
                .unwrap();
            assert_eq!(view.table.board, vec![sent.clone()]);
        }
    }

    /// Library play across the wire keeps ordering consistent everywhere.
    #[tokio::test]
    async fn library_actions_stay_consistent() {
        let mut room = RoomHarness::new("R1", "pw");
        let host = room.host("host").await.unwrap();
        let alice = room.join("alice").await.unwrap();

        let deck: Vec<Card> = (0..6)
            .map(|i| card(&format!("d{}", i), "alice", Zone::Library))
            .collect();
        alice
            .request(Action::AddToLibrary { cards: deck })
            .await
            .unwrap();
        for action in [
            Action::ShuffleLibrary {
                player_id: PlayerId::new("alice"),
            },
            Action::DrawFromLibrary {
                player_id: PlayerId::new("alice"),
            },
            Action::DrawFromLibrary {
                player_id: PlayerId::new("alice"),
            },
        ] {
            alice.request(action).await.unwrap();
        }

        let view = wait_for(&alice, "two cards in hand", |v| {
            v.table.board.iter().filter(|c| c.zone == Zone::Hand).count() == 2
        })
        .await
        .unwrap();
        let hand: Vec<u32> = {
            let mut hand: Vec<u32> = view
                .table
                .board
                .iter()
                .filter_map(|c| c.hand_index)
                .collect();
            hand.sort_unstable();
            hand
        };
        assert_eq!(hand, vec![0, 1]);

        wait_for(&host, "host caught up", |v| v.table == view.table)
            .await
            .unwrap();
        require(&[
            assert_ordering_consistent(&view.table),
            assert_unique_ids(&view.table),
            assert_converged(&room.views()),
        ]);
    }

    /// Tapping twice through the host restores the original state.
    #[tokio::test]
    async fn double_tap_restores_card() {
        let mut room = RoomHarness::new("R1", "pw");
        let host = room.host("host").await.unwrap();
        let alice = room.join("alice").await.unwrap();

        host.request(Action::Add {
            card: card("c1", "host", Zone::Battlefield),
        })
        .await
        .unwrap();
        wait_for(&alice, "card", |v| v.table.board.len() == 1)
            .await
            .unwrap();

        alice
            .request(Action::ToggleTap {
                id: CardId::new("c1"),
            })
            .await
            .unwrap();
        wait_for(&host, "tapped", |v| v.table.board[0].tapped)
            .await
            .unwrap();
        alice
            .request(Action::ToggleTap {
                id: CardId::new("c1"),
            })
            .await
            .unwrap();
        let view = wait_for(&host, "untapped", |v| !v.table.board[0].tapped)
            .await
            .unwrap();
        assert_eq!(view.table.board[0], card("c1", "host", Zone::Battlefield));
    }

    /// Acting before joining is reported locally, never sent.
    #[tokio::test]
    async fn acting_outside_a_room_is_refused() {
        let mut room = RoomHarness::new("R1", "pw");
        // Nobody hosts R1, so the join fails.
        let lonely = room.join_with_password("alice", "pw");
        wait_for(&lonely, "join failure", |v| {
            matches!(v.state, tablesync_peer::ConnectionState::Error { .. })
        })
        .await
        .unwrap();

        let err = lonely
            .request(Action::ToggleTap {
                id: CardId::new("c1"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotJoined));
    }
}
