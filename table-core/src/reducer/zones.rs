//! Zone transitions and stack ordering.
//!
//! Stack zones order their cards with `stack_index` (higher is on top).
//! Indices are unique within one player's stack and never negative; they
//! are not required to be contiguous.

use rand::seq::SliceRandom;
use rand::Rng;
use tablesync_types::{Card, CardId, LibraryPlace, PlayerId, Position, StackZonePositions, Zone};

use super::hand::{next_hand_index, reindex_hand};

fn in_stack(card: &Card, owner: &PlayerId, zone: Zone) -> bool {
    card.zone == zone && &card.owner == owner
}

/// Board positions of a player's stack, bottom to top.
pub(crate) fn stack_order(board: &[Card], owner: &PlayerId, zone: Zone) -> Vec<usize> {
    let mut order: Vec<usize> = (0..board.len())
        .filter(|&i| in_stack(&board[i], owner, zone) && board[i].stack_index.is_some())
        .collect();
    order.sort_by(|&a, &b| {
        board[a]
            .stack_index
            .cmp(&board[b].stack_index)
            .then_with(|| board[a].id.cmp(&board[b].id))
    });
    order
}

/// Shift every card of the stack at or above `from` up by one, except `mover`.
fn shift_up(board: &mut [Card], owner: &PlayerId, zone: Zone, mover: &CardId, from: u32) {
    for card in board.iter_mut() {
        if in_stack(card, owner, zone) && &card.id != mover {
            if let Some(index) = card.stack_index.as_mut() {
                if *index >= from {
                    *index += 1;
                }
            }
        }
    }
}

/// Compute the stack index for `mover` entering a player's stack zone.
///
/// Other cards of the stack are shifted when the new card has to go
/// underneath index 0 or between two existing cards.
pub(crate) fn claim_stack_slot<R: Rng + ?Sized>(
    board: &mut [Card],
    mover: &CardId,
    owner: &PlayerId,
    zone: Zone,
    place: LibraryPlace,
    rng: &mut R,
) -> u32 {
    let mut existing: Vec<u32> = board
        .iter()
        .filter(|c| in_stack(c, owner, zone) && &c.id != mover)
        .filter_map(|c| c.stack_index)
        .collect();
    existing.sort_unstable();

    let (Some(&min), Some(&max)) = (existing.first(), existing.last()) else {
        return 0;
    };

    let bottom = |board: &mut [Card]| {
        if min == 0 {
            shift_up(board, owner, zone, mover, 0);
            0
        } else {
            min - 1
        }
    };

    match place {
        LibraryPlace::Top => max + 1,
        LibraryPlace::Bottom => bottom(board),
        LibraryPlace::Random => {
            let slot = rng.gen_range(0..=existing.len());
            if slot == 0 {
                bottom(board)
            } else if slot == existing.len() {
                max + 1
            } else {
                let target = existing[slot];
                shift_up(board, owner, zone, mover, target);
                target
            }
        }
    }
}

/// Move the card at `i` into `zone`, recomputing its ordering fields.
///
/// Clears the field the target zone does not use, assigns the one it does,
/// counts commander deaths and keeps the owner's hand contiguous.
pub(crate) fn enter_zone<R: Rng + ?Sized>(
    board: &mut [Card],
    i: usize,
    zone: Zone,
    position: Position,
    place: LibraryPlace,
    rng: &mut R,
) {
    let from = board[i].zone;
    let owner = board[i].owner.clone();
    let id = board[i].id.clone();

    if board[i].is_commander && from == Zone::Battlefield && zone == Zone::Commander {
        let deaths = board[i].commander_deaths.unwrap_or(0);
        board[i].commander_deaths = Some(deaths + 1);
    }

    board[i].stack_index = None;
    board[i].hand_index = None;
    board[i].zone = zone;
    board[i].position = position;

    match zone {
        Zone::Battlefield => {}
        Zone::Hand => {
            board[i].hand_index = Some(next_hand_index(board, &owner, &id));
        }
        _ => {
            let slot = claim_stack_slot(board, &id, &owner, zone, place, rng);
            board[i].stack_index = Some(slot);
        }
    }

    if from == Zone::Hand || zone == Zone::Hand {
        reindex_hand(board, &owner);
    }
}

/// Take the top library card of `owner` into their hand.
///
/// The new top card inherits the drawn card's board position. Returns
/// `false` when the library is empty.
pub(crate) fn draw(board: &mut [Card], owner: &PlayerId) -> bool {
    let library = stack_order(board, owner, Zone::Library);
    let Some((&top, rest)) = library.split_last() else {
        return false;
    };
    let vacated = board[top].position;
    let id = board[top].id.clone();

    board[top].zone = Zone::Hand;
    board[top].stack_index = None;
    board[top].hand_index = Some(next_hand_index(board, owner, &id));

    if let Some(&new_top) = rest.last() {
        board[new_top].position = vacated;
    }

    reindex_hand(board, owner);
    true
}

/// Randomly permute the stack indices of a player's stack zone.
///
/// Each index keeps its board position, so only the relative order of the
/// cards changes. Returns `false` when the stack is empty.
pub(crate) fn shuffle_stack<R: Rng + ?Sized>(
    board: &mut [Card],
    owner: &PlayerId,
    zone: Zone,
    rng: &mut R,
) -> bool {
    let mut members = stack_order(board, owner, zone);
    if members.is_empty() {
        return false;
    }
    let slots: Vec<(Option<u32>, Position)> = members
        .iter()
        .map(|&i| (board[i].stack_index, board[i].position))
        .collect();

    members.shuffle(rng);
    for (&(index, position), &i) in slots.iter().zip(&members) {
        board[i].stack_index = index;
        board[i].position = position;
    }
    true
}

/// Where a card entering `owner`'s `zone` is drawn: the tracked stack
/// position when there is one, otherwise `fallback`.
pub(crate) fn stack_position(
    positions: &StackZonePositions,
    owner: &PlayerId,
    zone: Zone,
    fallback: Position,
) -> Position {
    positions.get(owner, zone).unwrap_or(fallback)
}
