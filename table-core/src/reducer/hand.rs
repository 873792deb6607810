//! Hand ordering helpers.
//!
//! A hand is ordered left to right by `hand_index`. After every structural
//! change the indices are made contiguous and zero-based again.

use tablesync_types::{Card, CardId, PlayerId, Zone};

fn in_hand(card: &Card, owner: &PlayerId) -> bool {
    card.zone == Zone::Hand && &card.owner == owner
}

/// Index one past the rightmost hand card of `owner`, ignoring `mover`.
pub(crate) fn next_hand_index(board: &[Card], owner: &PlayerId, mover: &CardId) -> u32 {
    board
        .iter()
        .filter(|c| in_hand(c, owner) && &c.id != mover)
        .filter_map(|c| c.hand_index)
        .max()
        .map_or(0, |max| max + 1)
}

/// Board positions of `owner`'s hand cards, left to right.
///
/// Ties on `hand_index` (and missing indices) fall back to id order.
pub(crate) fn hand_order(board: &[Card], owner: &PlayerId) -> Vec<usize> {
    let mut order: Vec<usize> = (0..board.len())
        .filter(|&i| in_hand(&board[i], owner))
        .collect();
    order.sort_by(|&a, &b| {
        let (a, b) = (&board[a], &board[b]);
        a.hand_index
            .unwrap_or(u32::MAX)
            .cmp(&b.hand_index.unwrap_or(u32::MAX))
            .then_with(|| a.id.cmp(&b.id))
    });
    order
}

/// Reassign contiguous zero-based hand indices, keeping relative order.
pub fn reindex_hand(board: &mut [Card], owner: &PlayerId) {
    for (slot, i) in hand_order(board, owner).into_iter().enumerate() {
        board[i].hand_index = Some(slot as u32);
    }
}

/// Move a hand card to `new_index`, shifting its neighbours.
///
/// Returns `false` when the card is not in a hand.
pub(crate) fn reorder_hand(board: &mut [Card], id: &CardId, new_index: u32) -> bool {
    let Some(owner) = board
        .iter()
        .find(|c| &c.id == id && c.zone == Zone::Hand)
        .map(|c| c.owner.clone())
    else {
        return false;
    };

    let mut order = hand_order(board, &owner);
    let Some(from) = order.iter().position(|&i| &board[i].id == id) else {
        return false;
    };
    let moved = order.remove(from);
    let to = (new_index as usize).min(order.len());
    order.insert(to, moved);

    for (slot, i) in order.into_iter().enumerate() {
        board[i].hand_index = Some(slot as u32);
    }
    true
}
