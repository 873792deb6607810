//! Board actions.
//!
//! An [`Action`] is a discrete, typed description of one mutation of the
//! shared table. Peers send actions to the host; only the host applies them.

use serde::{Deserialize, Serialize};

use crate::{Card, CardId, Counter, CounterId, CounterKind, PlayerId, Position, Zone};

/// Where a card lands when it enters a stack zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryPlace {
    /// On top of the stack.
    #[default]
    Top,
    /// Under every other card.
    Bottom,
    /// A uniformly random slot.
    Random,
}

/// All possible board actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    /// Put a new card on the table.
    Add {
        /// The card, including its target zone.
        card: Card,
    },
    /// Drag a card to a new position without changing zone.
    Move {
        /// Card to move.
        id: CardId,
        /// New position.
        position: Position,
    },
    /// Drag a whole stack zone.
    #[serde(rename_all = "camelCase")]
    MoveStackZone {
        /// Stack zone being dragged.
        zone: Zone,
        /// Owner of the stack.
        player_id: PlayerId,
        /// New position of the stack.
        position: Position,
    },
    /// Flip the tapped flag.
    ToggleTap {
        /// Card to tap or untap.
        id: CardId,
    },
    /// Remove a card from the table.
    Remove {
        /// Card to remove.
        id: CardId,
    },
    /// Put cards on top of their owner's library, in order.
    AddToLibrary {
        /// Cards to add; the last one ends up on top.
        cards: Vec<Card>,
    },
    /// Replace a player's whole library (deck import).
    #[serde(rename_all = "camelCase")]
    ReplaceLibrary {
        /// New library contents, bottom first.
        cards: Vec<Card>,
        /// Library owner.
        player_id: PlayerId,
    },
    /// Move the top library card into the hand.
    #[serde(rename_all = "camelCase")]
    DrawFromLibrary {
        /// Drawing player.
        player_id: PlayerId,
    },
    /// Move a card to another zone.
    #[serde(rename_all = "camelCase")]
    ChangeZone {
        /// Card to move.
        id: CardId,
        /// Target zone.
        zone: Zone,
        /// Position in the target zone.
        position: Position,
        /// Stack placement; `Top` when omitted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        library_place: Option<LibraryPlace>,
    },
    /// Randomly reorder a player's library.
    #[serde(rename_all = "camelCase")]
    ShuffleLibrary {
        /// Library owner.
        player_id: PlayerId,
    },
    /// Shuffle the hand back into the library.
    #[serde(rename_all = "camelCase")]
    Mulligan {
        /// Player taking the mulligan.
        player_id: PlayerId,
    },
    /// Move a hand card to another slot of the hand.
    #[serde(rename_all = "camelCase")]
    ReorderHandCard {
        /// Hand card to move.
        id: CardId,
        /// Target slot, clamped to the hand size.
        new_index: u32,
    },
    /// Flip a card face down or face up.
    FlipCard {
        /// Card to flip.
        id: CardId,
    },
    /// Mark or unmark a card as its owner's commander.
    #[serde(rename_all = "camelCase")]
    SetCommander {
        /// Card to mark.
        id: CardId,
        /// New commander flag.
        is_commander: bool,
    },
    /// Place a counter token.
    CreateCounter {
        /// The new counter.
        counter: Counter,
    },
    /// Drag a counter token.
    MoveCounter {
        /// Counter to move.
        id: CounterId,
        /// New position.
        position: Position,
    },
    /// Replace a counter's value.
    ModifyCounter {
        /// Counter to modify.
        id: CounterId,
        /// New value.
        value: CounterKind,
    },
    /// Remove a counter token.
    RemoveCounterToken {
        /// Counter to remove.
        id: CounterId,
    },
    /// Set a player's life total.
    #[serde(rename_all = "camelCase")]
    SetPlayerLife {
        /// Player whose life changes.
        player_id: PlayerId,
        /// New life total.
        life: i32,
    },
}

impl Action {
    /// Wire name of the action kind, for logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Add { .. } => "add",
            Action::Move { .. } => "move",
            Action::MoveStackZone { .. } => "moveStackZone",
            Action::ToggleTap { .. } => "toggleTap",
            Action::Remove { .. } => "remove",
            Action::AddToLibrary { .. } => "addToLibrary",
            Action::ReplaceLibrary { .. } => "replaceLibrary",
            Action::DrawFromLibrary { .. } => "drawFromLibrary",
            Action::ChangeZone { .. } => "changeZone",
            Action::ShuffleLibrary { .. } => "shuffleLibrary",
            Action::Mulligan { .. } => "mulligan",
            Action::ReorderHandCard { .. } => "reorderHandCard",
            Action::FlipCard { .. } => "flipCard",
            Action::SetCommander { .. } => "setCommander",
            Action::CreateCounter { .. } => "createCounter",
            Action::MoveCounter { .. } => "moveCounter",
            Action::ModifyCounter { .. } => "modifyCounter",
            Action::RemoveCounterToken { .. } => "removeCounterToken",
            Action::SetPlayerLife { .. } => "setPlayerLife",
        }
    }

    /// Positional drags a client may echo locally before the host confirms.
    pub fn is_optimistic(&self) -> bool {
        matches!(
            self,
            Action::Move { .. } | Action::MoveCounter { .. } | Action::MoveStackZone { .. }
        )
    }
}
