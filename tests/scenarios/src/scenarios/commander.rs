//! Commander scenarios.

#[cfg(test)]
mod tests {
    use crate::harness::{wait_for, RoomHarness};
    use tablesync_types::{Action, Card, CardId, PlayerId, Position, Zone};

    /// A commander with two deaths that goes back to the command zone from
    /// the battlefield has three, on every peer.
    #[tokio::test]
    async fn commander_death_is_counted() {
        let mut room = RoomHarness::new("R1", "pw");
        let host = room.host("host").await.unwrap();
        let alice = room.join("alice").await.unwrap();

        let mut commander = Card::new(
            CardId::new("cmd"),
            "Atraxa",
            PlayerId::new("alice"),
            Zone::Battlefield,
            Position::new(50.0, 50.0),
        );
        commander.is_commander = true;
        commander.commander_deaths = Some(2);
        alice.request(Action::Add { card: commander }).await.unwrap();
        wait_for(&host, "commander on battlefield", |v| v.table.board.len() == 1)
            .await
            .unwrap();

        alice
            .request(Action::ChangeZone {
                id: CardId::new("cmd"),
                zone: Zone::Commander,
                position: Position::new(0.0, 0.0),
                library_place: None,
            })
            .await
            .unwrap();

        for session in [&host, &alice] {
            let view = wait_for(session, "commander returned", |v| {
                v.table.board.first().is_some_and(|c| c.zone == Zone::Commander)
            })
            .await
            .unwrap();
            let card = &view.table.board[0];
            assert_eq!(card.commander_deaths, Some(3));
            assert!(card.is_commander);
            assert!(card.stack_index.is_some());
        }
    }

    /// Marking a commander starts its death count at zero.
    #[tokio::test]
    async fn marking_a_commander_starts_the_count() {
        let mut room = RoomHarness::new("R1", "pw");
        let host = room.host("host").await.unwrap();
        let alice = room.join("alice").await.unwrap();

        host.request(Action::Add {
            card: Card::new(
                CardId::new("c1"),
                "Edgar Markov",
                PlayerId::new("alice"),
                Zone::Battlefield,
                Position::default(),
            ),
        })
        .await
        .unwrap();
        alice
            .request(Action::SetCommander {
                id: CardId::new("c1"),
                is_commander: true,
            })
            .await
            .unwrap();

        let view = wait_for(&alice, "commander marked", |v| {
            v.table.board.first().is_some_and(|c| c.is_commander)
        })
        .await
        .unwrap();
        assert_eq!(view.table.board[0].commander_deaths, Some(0));
    }
}
