//! The action reducer.
//!
//! [`apply`] is the single place where the table changes. It never mutates
//! its input: the host clones the current table, applies one action and
//! broadcasts the result. Actions that reference unknown entities, or that
//! would not change anything, come back as [`Outcome::Ignored`] with the
//! reason so the caller can log it.

mod hand;
mod zones;

use rand::Rng;
use tablesync_types::{
    Action, Card, CardId, CounterId, LibraryPlace, PlayerId, Position, TableState, Zone,
};
use thiserror::Error;

pub use hand::reindex_hand;

/// Result of applying one action.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The action produced a new table.
    Applied {
        /// The new table.
        state: TableState,
        /// Whether the roster changed (life totals), which calls for a full
        /// room snapshot instead of a board snapshot.
        roster_changed: bool,
    },
    /// The action was a no-op.
    Ignored(IgnoreReason),
}

impl Outcome {
    /// The resulting table, or `current` when the action was ignored.
    pub fn into_state(self, current: &TableState) -> TableState {
        match self {
            Outcome::Applied { state, .. } => state,
            Outcome::Ignored(_) => current.clone(),
        }
    }

    /// Whether the action changed the table.
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }
}

/// Why an action left the table untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IgnoreReason {
    /// No card with this id.
    #[error("unknown card {0}")]
    UnknownCard(CardId),

    /// A card with this id already exists.
    #[error("duplicate card {0}")]
    DuplicateCard(CardId),

    /// No counter with this id.
    #[error("unknown counter {0}")]
    UnknownCounter(CounterId),

    /// A counter with this id already exists.
    #[error("duplicate counter {0}")]
    DuplicateCounter(CounterId),

    /// No player with this id in the roster.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    /// The player's library is empty.
    #[error("library of {0} is empty")]
    EmptyLibrary(PlayerId),

    /// The zone is not a stacked zone.
    #[error("{0:?} is not a stack zone")]
    NotStackZone(Zone),

    /// The card is not in a hand.
    #[error("card {0} is not in a hand")]
    NotInHand(CardId),

    /// The action carried nothing to apply.
    #[error("nothing to apply")]
    Empty,
}

/// Apply one action to a table.
///
/// `rng` drives random library placement and shuffles; pass a seeded
/// generator for reproducible results.
pub fn apply<R: Rng + ?Sized>(state: &TableState, action: &Action, rng: &mut R) -> Outcome {
    let mut next = state.clone();
    let result = match action {
        Action::Add { card } => add(&mut next, card, rng),
        Action::Move { id, position } => with_card(&mut next, id, |card| {
            card.position = *position;
        }),
        Action::MoveStackZone {
            zone,
            player_id,
            position,
        } => move_stack_zone(&mut next, *zone, player_id, *position),
        Action::ToggleTap { id } => with_card(&mut next, id, |card| {
            card.tapped = !card.tapped;
        }),
        Action::FlipCard { id } => with_card(&mut next, id, |card| {
            card.flipped = !card.flipped;
        }),
        Action::Remove { id } => remove(&mut next, id),
        Action::AddToLibrary { cards } => add_to_library(&mut next, cards, rng),
        Action::ReplaceLibrary { cards, player_id } => {
            replace_library(&mut next, cards, player_id);
            Ok(())
        }
        Action::DrawFromLibrary { player_id } => {
            if zones::draw(&mut next.board, player_id) {
                Ok(())
            } else {
                Err(IgnoreReason::EmptyLibrary(player_id.clone()))
            }
        }
        Action::ChangeZone {
            id,
            zone,
            position,
            library_place,
        } => match next.board.iter().position(|c| &c.id == id) {
            Some(i) => {
                zones::enter_zone(
                    &mut next.board,
                    i,
                    *zone,
                    *position,
                    library_place.unwrap_or_default(),
                    rng,
                );
                Ok(())
            }
            None => Err(IgnoreReason::UnknownCard(id.clone())),
        },
        Action::ShuffleLibrary { player_id } => {
            if zones::shuffle_stack(&mut next.board, player_id, Zone::Library, rng) {
                Ok(())
            } else {
                Err(IgnoreReason::EmptyLibrary(player_id.clone()))
            }
        }
        Action::Mulligan { player_id } => mulligan(&mut next, player_id, rng),
        Action::ReorderHandCard { id, new_index } => {
            if hand::reorder_hand(&mut next.board, id, *new_index) {
                Ok(())
            } else if next.card(id).is_some() {
                Err(IgnoreReason::NotInHand(id.clone()))
            } else {
                Err(IgnoreReason::UnknownCard(id.clone()))
            }
        }
        Action::SetCommander { id, is_commander } => with_card(&mut next, id, |card| {
            card.is_commander = *is_commander;
            if *is_commander && card.commander_deaths.is_none() {
                card.commander_deaths = Some(0);
            }
        }),
        Action::CreateCounter { counter } => {
            if next.counter(&counter.id).is_some() {
                Err(IgnoreReason::DuplicateCounter(counter.id.clone()))
            } else {
                next.counters.push(counter.clone());
                Ok(())
            }
        }
        Action::MoveCounter { id, position } => {
            match next.counters.iter_mut().find(|c| &c.id == id) {
                Some(counter) => {
                    counter.position = *position;
                    Ok(())
                }
                None => Err(IgnoreReason::UnknownCounter(id.clone())),
            }
        }
        Action::ModifyCounter { id, value } => {
            match next.counters.iter_mut().find(|c| &c.id == id) {
                Some(counter) => {
                    counter.kind = value.clone();
                    Ok(())
                }
                None => Err(IgnoreReason::UnknownCounter(id.clone())),
            }
        }
        Action::RemoveCounterToken { id } => {
            let before = next.counters.len();
            next.counters.retain(|c| &c.id != id);
            if next.counters.len() < before {
                Ok(())
            } else {
                Err(IgnoreReason::UnknownCounter(id.clone()))
            }
        }
        Action::SetPlayerLife { player_id, life } => {
            match next.players.iter_mut().find(|p| &p.id == player_id) {
                Some(player) => {
                    player.life = *life;
                    Ok(())
                }
                None => Err(IgnoreReason::UnknownPlayer(player_id.clone())),
            }
        }
    };

    match result {
        Ok(()) => Outcome::Applied {
            state: next,
            roster_changed: matches!(action, Action::SetPlayerLife { .. }),
        },
        Err(reason) => Outcome::Ignored(reason),
    }
}

/// Apply an action and return the new table, or a copy of the input when
/// the action is ignored.
pub fn reduce<R: Rng + ?Sized>(state: &TableState, action: &Action, rng: &mut R) -> TableState {
    apply(state, action, rng).into_state(state)
}

fn with_card(
    table: &mut TableState,
    id: &CardId,
    f: impl FnOnce(&mut Card),
) -> Result<(), IgnoreReason> {
    match table.board.iter_mut().find(|c| &c.id == id) {
        Some(card) => {
            f(card);
            Ok(())
        }
        None => Err(IgnoreReason::UnknownCard(id.clone())),
    }
}

fn add<R: Rng + ?Sized>(
    table: &mut TableState,
    card: &Card,
    rng: &mut R,
) -> Result<(), IgnoreReason> {
    if table.card(&card.id).is_some() {
        return Err(IgnoreReason::DuplicateCard(card.id.clone()));
    }
    let mut card = card.clone();
    let zone = card.zone;
    let position = card.position;
    // Placed as a loose battlefield card first so `enter_zone` assigns the
    // ordering field of the requested zone from scratch.
    card.zone = Zone::Battlefield;
    card.stack_index = None;
    card.hand_index = None;
    let commander = std::mem::replace(&mut card.is_commander, false);
    table.board.push(card);

    let i = table.board.len() - 1;
    zones::enter_zone(&mut table.board, i, zone, position, LibraryPlace::Top, rng);
    table.board[i].is_commander = commander;
    Ok(())
}

fn remove(table: &mut TableState, id: &CardId) -> Result<(), IgnoreReason> {
    let Some(i) = table.board.iter().position(|c| &c.id == id) else {
        return Err(IgnoreReason::UnknownCard(id.clone()));
    };
    let card = table.board.remove(i);
    if card.zone == Zone::Hand {
        reindex_hand(&mut table.board, &card.owner);
    }
    Ok(())
}

fn move_stack_zone(
    table: &mut TableState,
    zone: Zone,
    player: &PlayerId,
    position: Position,
) -> Result<(), IgnoreReason> {
    if !zone.is_stack() {
        return Err(IgnoreReason::NotStackZone(zone));
    }
    table.stack_zone_positions.set(player, zone, position);
    for card in table
        .board
        .iter_mut()
        .filter(|c| c.zone == zone && &c.owner == player)
    {
        card.position = position;
    }
    Ok(())
}

fn add_to_library<R: Rng + ?Sized>(
    table: &mut TableState,
    cards: &[Card],
    rng: &mut R,
) -> Result<(), IgnoreReason> {
    let mut added = 0;
    for card in cards {
        if table.card(&card.id).is_some() {
            continue;
        }
        let position = zones::stack_position(
            &table.stack_zone_positions,
            &card.owner,
            Zone::Library,
            card.position,
        );
        let mut card = card.clone();
        card.zone = Zone::Battlefield;
        card.stack_index = None;
        card.hand_index = None;
        table.board.push(card);
        let i = table.board.len() - 1;
        zones::enter_zone(&mut table.board, i, Zone::Library, position, LibraryPlace::Top, rng);
        added += 1;
    }
    if added == 0 {
        Err(IgnoreReason::Empty)
    } else {
        Ok(())
    }
}

fn replace_library(table: &mut TableState, cards: &[Card], player: &PlayerId) {
    table
        .board
        .retain(|c| !(c.zone == Zone::Library && &c.owner == player));

    let mut index = 0;
    for card in cards {
        if table.card(&card.id).is_some() {
            continue;
        }
        let mut card = card.clone();
        card.position = zones::stack_position(
            &table.stack_zone_positions,
            player,
            Zone::Library,
            card.position,
        );
        card.owner = player.clone();
        card.zone = Zone::Library;
        card.hand_index = None;
        card.stack_index = Some(index);
        table.board.push(card);
        index += 1;
    }
}

fn mulligan<R: Rng + ?Sized>(
    table: &mut TableState,
    player: &PlayerId,
    rng: &mut R,
) -> Result<(), IgnoreReason> {
    let hand: Vec<CardId> = hand::hand_order(&table.board, player)
        .into_iter()
        .map(|i| table.board[i].id.clone())
        .collect();

    for id in &hand {
        if let Some(i) = table.board.iter().position(|c| &c.id == id) {
            let position = zones::stack_position(
                &table.stack_zone_positions,
                player,
                Zone::Library,
                table.board[i].position,
            );
            zones::enter_zone(&mut table.board, i, Zone::Library, position, LibraryPlace::Top, rng);
        }
    }

    if zones::shuffle_stack(&mut table.board, player, Zone::Library, rng) || !hand.is_empty() {
        Ok(())
    } else {
        Err(IgnoreReason::EmptyLibrary(player.clone()))
    }
}
