//! Shared board data model.
//!
//! Plain data only. The ordering invariants documented here are enforced by
//! the reducer in `tablesync-core`, never by these types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{CardId, CounterId, PlayerId};

/// Life total assigned to a player when they join a room.
pub const STARTING_LIFE: i32 = 20;

/// Where a card currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// In play, freely positioned.
    Battlefield,
    /// Draw pile.
    Library,
    /// Private hand, ordered left to right by `hand_index`.
    Hand,
    /// Discard pile.
    Cemetery,
    /// Removed from play.
    Exile,
    /// Command zone.
    Commander,
    /// Token pile.
    Tokens,
}

impl Zone {
    /// Zones whose cards have a strict top-to-bottom order (`stack_index`).
    pub const STACKS: [Zone; 5] = [
        Zone::Library,
        Zone::Cemetery,
        Zone::Exile,
        Zone::Commander,
        Zone::Tokens,
    ];

    /// Whether this zone orders its cards with `stack_index`.
    pub fn is_stack(&self) -> bool {
        Self::STACKS.contains(self)
    }
}

/// Absolute 2D board position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Display fields returned by the card lookup service.
///
/// Stored as-is; legality is never checked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMetadata {
    /// Mana cost, e.g. `{1}{R}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<String>,
    /// Type line, e.g. `Instant`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_line: Option<String>,
    /// Rules text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_text: Option<String>,
    /// Front face image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Back face image for double-faced cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_image_url: Option<String>,
}

/// A card on the shared board.
///
/// Exactly one of `stack_index` / `hand_index` is set when the card is in a
/// stack zone or in hand respectively; both are `None` on the battlefield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Card identity.
    pub id: CardId,
    /// Display name.
    pub name: String,
    /// Optional lookup metadata.
    #[serde(default)]
    pub metadata: CardMetadata,
    /// Owning player.
    pub owner: PlayerId,
    /// Current zone.
    pub zone: Zone,
    /// Board position.
    pub position: Position,
    /// Tapped (rotated) flag.
    #[serde(default)]
    pub tapped: bool,
    /// Face-down / back-face flag.
    #[serde(default)]
    pub flipped: bool,
    /// Order within a stack zone, higher is on top.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_index: Option<u32>,
    /// Left-to-right order within the hand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_index: Option<u32>,
    /// Whether the card is its owner's commander.
    #[serde(default)]
    pub is_commander: bool,
    /// Times the commander returned to the command zone from the battlefield.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commander_deaths: Option<u32>,
}

impl Card {
    /// Create an untapped, face-up card with no ordering fields.
    pub fn new(
        id: CardId,
        name: impl Into<String>,
        owner: PlayerId,
        zone: Zone,
        position: Position,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            metadata: CardMetadata::default(),
            owner,
            zone,
            position,
            tapped: false,
            flipped: false,
            stack_index: None,
            hand_index: None,
            is_commander: false,
            commander_deaths: None,
        }
    }

    /// Attach lookup metadata.
    pub fn with_metadata(mut self, metadata: CardMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the ordering fields agree with the current zone.
    pub fn ordering_consistent(&self) -> bool {
        match self.zone {
            Zone::Battlefield => self.stack_index.is_none() && self.hand_index.is_none(),
            Zone::Hand => self.stack_index.is_none() && self.hand_index.is_some(),
            _ => self.stack_index.is_some() && self.hand_index.is_none(),
        }
    }
}

/// The value carried by a counter token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CounterKind {
    /// A single integer.
    Numeral {
        /// Current value.
        value: i32,
    },
    /// Independent power/toughness style modifiers.
    Plus {
        /// First modifier.
        x: i32,
        /// Second modifier.
        y: i32,
    },
}

/// A counter token placed on the board.
///
/// Counters are independent of cards: removing a card never removes one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counter {
    /// Counter identity.
    pub id: CounterId,
    /// Owning player.
    pub owner: PlayerId,
    /// Counter value.
    pub kind: CounterKind,
    /// Absolute board position.
    pub position: Position,
}

/// A participant in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Stable identity.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Life total.
    pub life: i32,
}

impl Player {
    /// Create a player with the starting life total.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            life: STARTING_LIFE,
        }
    }
}

/// Per-player positions of the stacked zones.
///
/// Only the top of a stack is rendered, so the stack position is tracked
/// here rather than on every card in it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackZonePositions(BTreeMap<PlayerId, BTreeMap<Zone, Position>>);

impl StackZonePositions {
    /// Create an empty map.
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Tracked position of a player's stack zone.
    pub fn get(&self, player: &PlayerId, zone: Zone) -> Option<Position> {
        self.0.get(player).and_then(|zones| zones.get(&zone)).copied()
    }

    /// Track a new position for a player's stack zone.
    pub fn set(&mut self, player: &PlayerId, zone: Zone, position: Position) {
        self.0
            .entry(player.clone())
            .or_default()
            .insert(zone, position);
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The complete shared table: board, counters, roster and stack positions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
    /// Every card, in any zone.
    pub board: Vec<Card>,
    /// Counter tokens.
    pub counters: Vec<Counter>,
    /// Roster, in join order. The first entry is the next host candidate.
    pub players: Vec<Player>,
    /// Tracked stack zone positions.
    pub stack_zone_positions: StackZonePositions,
}

impl TableState {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            board: Vec::new(),
            counters: Vec::new(),
            players: Vec::new(),
            stack_zone_positions: StackZonePositions::new(),
        }
    }

    /// Look up a card.
    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.board.iter().find(|c| &c.id == id)
    }

    /// Look up a counter.
    pub fn counter(&self, id: &CounterId) -> Option<&Counter> {
        self.counters.iter().find(|c| &c.id == id)
    }

    /// Look up a player.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// A player's hand, left to right.
    pub fn hand(&self, player: &PlayerId) -> Vec<&Card> {
        let mut hand: Vec<&Card> = self
            .board
            .iter()
            .filter(|c| c.zone == Zone::Hand && &c.owner == player)
            .collect();
        hand.sort_by(|a, b| {
            a.hand_index
                .cmp(&b.hand_index)
                .then_with(|| a.id.cmp(&b.id))
        });
        hand
    }

    /// A player's stack zone, bottom to top.
    pub fn stack(&self, player: &PlayerId, zone: Zone) -> Vec<&Card> {
        let mut stack: Vec<&Card> = self
            .board
            .iter()
            .filter(|c| c.zone == zone && &c.owner == player)
            .collect();
        stack.sort_by(|a, b| {
            a.stack_index
                .cmp(&b.stack_index)
                .then_with(|| a.id.cmp(&b.id))
        });
        stack
    }
}
