//! Assertion helpers for scenarios.
//!
//! Pure functions over tables and session views. Each returns an
//! [`AssertionResult`] so scenarios can report every broken property at once.

use std::collections::HashSet;

use tablesync_peer::{Role, SessionView};
use tablesync_types::{TableState, Zone};

/// Result of an assertion check.
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// Whether the assertion passed.
    pub passed: bool,
    /// Description of what was checked.
    pub description: String,
    /// Details on failure.
    pub failure_details: Option<String>,
}

impl AssertionResult {
    /// Create a passing result.
    pub fn pass(description: &str) -> Self {
        Self {
            passed: true,
            description: description.into(),
            failure_details: None,
        }
    }

    /// Create a failing result.
    pub fn fail(description: &str, details: &str) -> Self {
        Self {
            passed: false,
            description: description.into(),
            failure_details: Some(details.into()),
        }
    }
}

/// Every card carries exactly the ordering field its zone calls for.
///
/// Stack indices must be unique per owner and zone; hand indices must run
/// `0..n` per owner.
pub fn assert_ordering_consistent(table: &TableState) -> AssertionResult {
    let description = "ordering fields match zones";
    for card in &table.board {
        let ok = match card.zone {
            Zone::Battlefield => card.stack_index.is_none() && card.hand_index.is_none(),
            Zone::Hand => card.stack_index.is_none() && card.hand_index.is_some(),
            _ => card.stack_index.is_some() && card.hand_index.is_none(),
        };
        if !ok {
            return AssertionResult::fail(
                description,
                &format!(
                    "card {} in {:?} has stack_index={:?} hand_index={:?}",
                    card.id, card.zone, card.stack_index, card.hand_index
                ),
            );
        }
    }

    let mut groups: Vec<((&str, Zone), Vec<u32>)> = Vec::new();
    for card in &table.board {
        let Some(index) = card.stack_index.or(card.hand_index) else {
            continue;
        };
        let key = (card.owner.as_str(), card.zone);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, indices)) => indices.push(index),
            None => groups.push((key, vec![index])),
        }
    }
    for ((owner, zone), mut indices) in groups {
        indices.sort_unstable();
        let broken = if zone == Zone::Hand {
            indices.iter().enumerate().any(|(i, &index)| index != i as u32)
        } else {
            indices.windows(2).any(|pair| pair[0] == pair[1])
        };
        if broken {
            return AssertionResult::fail(
                description,
                &format!("{:?} of {} has indices {:?}", zone, owner, indices),
            );
        }
    }
    AssertionResult::pass(description)
}

/// No two cards or counters share an id.
pub fn assert_unique_ids(table: &TableState) -> AssertionResult {
    let description = "ids are unique";
    let mut cards = HashSet::new();
    for card in &table.board {
        if !cards.insert(card.id.as_str()) {
            return AssertionResult::fail(description, &format!("card {} twice", card.id));
        }
    }
    let mut counters = HashSet::new();
    for counter in &table.counters {
        if !counters.insert(counter.id.as_str()) {
            return AssertionResult::fail(description, &format!("counter {} twice", counter.id));
        }
    }
    AssertionResult::pass(description)
}

/// All views hold the same table at the same epoch.
pub fn assert_converged(views: &[SessionView]) -> AssertionResult {
    let description = "mirrors converged";
    let Some(first) = views.first() else {
        return AssertionResult::pass(description);
    };
    for view in &views[1..] {
        if view.epoch != first.epoch {
            return AssertionResult::fail(
                description,
                &format!(
                    "{} is at epoch {} but {} at {}",
                    view.player_id, view.epoch, first.player_id, first.epoch
                ),
            );
        }
        if view.table != first.table {
            return AssertionResult::fail(
                description,
                &format!("{} and {} hold different tables", view.player_id, first.player_id),
            );
        }
    }
    AssertionResult::pass(description)
}

/// Exactly one connected view is host, and it heads the roster.
pub fn assert_single_host(views: &[SessionView]) -> AssertionResult {
    let description = "exactly one host";
    let hosts: Vec<&SessionView> = views.iter().filter(|v| v.role == Some(Role::Host)).collect();
    match hosts.as_slice() {
        [host] => match host.table.players.first() {
            Some(first) if first.id == host.player_id => AssertionResult::pass(description),
            _ => AssertionResult::fail(
                description,
                &format!("host {} is not first in its roster", host.player_id),
            ),
        },
        [] => AssertionResult::fail(description, "no host"),
        many => {
            let ids: Vec<String> = many.iter().map(|v| v.player_id.to_string()).collect();
            AssertionResult::fail(description, &format!("several hosts: {}", ids.join(", ")))
        }
    }
}

/// Panic with every failure if any result failed.
pub fn require(results: &[AssertionResult]) {
    let failures: Vec<String> = results
        .iter()
        .filter(|r| !r.passed)
        .map(|r| {
            format!(
                "{}: {}",
                r.description,
                r.failure_details.as_deref().unwrap_or("failed")
            )
        })
        .collect();
    assert!(failures.is_empty(), "assertions failed:\n{}", failures.join("\n"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablesync_peer::ConnectionState;
    use tablesync_types::{Card, CardId, Player, PlayerId, Position, RoomId};

    fn card(id: &str, zone: Zone, stack: Option<u32>, hand: Option<u32>) -> Card {
        let mut card = Card::new(
            CardId::new(id),
            id,
            PlayerId::new("p1"),
            zone,
            Position::default(),
        );
        card.stack_index = stack;
        card.hand_index = hand;
        card
    }

    fn view(id: &str, role: Role, table: TableState) -> SessionView {
        SessionView {
            state: ConnectionState::Connected { role },
            role: Some(role),
            epoch: 0,
            table,
            room_id: RoomId::new("R1"),
            player_id: PlayerId::new(id),
        }
    }

    #[test]
    fn consistent_ordering_passes() {
        let mut table = TableState::new();
        table.board = vec![
            card("b", Zone::Battlefield, None, None),
            card("l0", Zone::Library, Some(0), None),
            card("l1", Zone::Library, Some(5), None),
            card("h0", Zone::Hand, None, Some(0)),
        ];
        assert!(assert_ordering_consistent(&table).passed);
    }

    #[test]
    fn wrong_field_or_gap_fails() {
        let mut table = TableState::new();
        table.board = vec![card("h", Zone::Hand, Some(0), None)];
        assert!(!assert_ordering_consistent(&table).passed);

        table.board = vec![
            card("h0", Zone::Hand, None, Some(0)),
            card("h2", Zone::Hand, None, Some(2)),
        ];
        let result = assert_ordering_consistent(&table);
        assert!(!result.passed);
        assert!(result.failure_details.unwrap().contains("[0, 2]"));

        table.board = vec![
            card("l0", Zone::Library, Some(3), None),
            card("l1", Zone::Library, Some(3), None),
        ];
        assert!(!assert_ordering_consistent(&table).passed);
    }

    #[test]
    fn duplicate_card_ids_fail() {
        let mut table = TableState::new();
        table.board = vec![
            card("x", Zone::Battlefield, None, None),
            card("x", Zone::Battlefield, None, None),
        ];
        assert!(!assert_unique_ids(&table).passed);
    }

    #[test]
    fn host_must_head_its_roster() {
        let mut table = TableState::new();
        table.players = vec![
            Player::new(PlayerId::new("a"), "A"),
            Player::new(PlayerId::new("b"), "B"),
        ];
        let good = [
            view("a", Role::Host, table.clone()),
            view("b", Role::Client, table.clone()),
        ];
        assert!(assert_single_host(&good).passed);
        assert!(assert_converged(&good).passed);

        let split = [
            view("a", Role::Host, table.clone()),
            view("b", Role::Host, table.clone()),
        ];
        assert!(!assert_single_host(&split).passed);
        assert!(!assert_single_host(&[view("b", Role::Host, table)]).passed);
    }

    #[test]
    fn diverged_tables_fail() {
        let mut other = TableState::new();
        other.board.push(card("x", Zone::Battlefield, None, None));
        let views = [
            view("a", Role::Host, TableState::new()),
            view("b", Role::Client, other),
        ];
        assert!(!assert_converged(&views).passed);
    }
}
