//! Protocol messages for tablesync.
//!
//! Every payload exchanged between peers is one [`Message`]. The set is
//! closed: anything that does not decode into a known variant is rejected
//! at the transport boundary.

use serde::{Deserialize, Serialize};

use crate::{Action, Card, Counter, Player, PlayerId, StackZonePositions, TableState, WireError};

/// All possible protocol messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    /// Peer asks the host to apply an action.
    RequestAction(RequestAction),
    /// Full room snapshot (board and roster).
    RoomState(RoomState),
    /// Board-only snapshot after an action that left the roster alone.
    BoardState(BoardState),
    /// Planned handover to a new host.
    HostTransfer(HostTransfer),
    /// Fatal error; the sender closes the channel afterwards.
    Error(ErrorMessage),
}

impl Message {
    /// Serialize to MessagePack bytes (named fields).
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec_named(self).map_err(WireError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        rmp_serde::from_slice(bytes).map_err(WireError::Deserialization)
    }

    /// Wire tag of this message, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::RequestAction(_) => "request-action",
            Message::RoomState(_) => "room-state",
            Message::BoardState(_) => "board-state",
            Message::HostTransfer(_) => "host-transfer",
            Message::Error(_) => "error",
        }
    }

    /// Build an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Message::Error(ErrorMessage {
            message: message.into(),
        })
    }
}

/// Join metadata presented when a peer dials the host.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinMetadata {
    /// Room password; a mismatch is the only rejection criterion.
    pub password: String,
    /// Display name of the joining player.
    pub display_name: String,
    /// Stable id of the joining player.
    pub player_id: PlayerId,
}

impl std::fmt::Debug for JoinMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinMetadata")
            .field("password", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("player_id", &self.player_id)
            .finish()
    }
}

/// Action request sent by a non-host peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAction {
    /// The requested mutation.
    pub action: Action,
    /// Player issuing the request.
    pub actor_id: PlayerId,
}

/// Full room snapshot.
///
/// Fields left out by the sender are preserved by the receiver.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    /// Host epoch that produced this snapshot.
    #[serde(default)]
    pub epoch: u64,
    /// Every card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<Card>>,
    /// Counter tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<Vec<Counter>>,
    /// Roster in join order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<Player>>,
    /// Tracked stack zone positions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_zone_positions: Option<StackZonePositions>,
}

impl RoomState {
    /// Snapshot every part of a table.
    pub fn full(epoch: u64, table: &TableState) -> Self {
        Self {
            epoch,
            board: Some(table.board.clone()),
            counters: Some(table.counters.clone()),
            players: Some(table.players.clone()),
            stack_zone_positions: Some(table.stack_zone_positions.clone()),
        }
    }
}

/// Board-only snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardState {
    /// Host epoch that produced this snapshot.
    #[serde(default)]
    pub epoch: u64,
    /// Every card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<Card>>,
    /// Counter tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<Vec<Counter>>,
    /// Tracked stack zone positions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_zone_positions: Option<StackZonePositions>,
}

impl BoardState {
    /// Snapshot the board part of a table.
    pub fn full(epoch: u64, table: &TableState) -> Self {
        Self {
            epoch,
            board: Some(table.board.clone()),
            counters: Some(table.counters.clone()),
            stack_zone_positions: Some(table.stack_zone_positions.clone()),
        }
    }
}

/// Planned handover of host authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostTransfer {
    /// Elected successor.
    pub new_host_id: PlayerId,
    /// Epoch the successor hosts under.
    pub epoch: u64,
    /// Every card.
    pub board: Vec<Card>,
    /// Counter tokens.
    pub counters: Vec<Counter>,
    /// Roster without the outgoing host.
    pub players: Vec<Player>,
    /// Tracked stack zone positions.
    #[serde(default)]
    pub stack_zone_positions: StackZonePositions,
}

impl HostTransfer {
    /// The table carried by this transfer.
    pub fn table(&self) -> TableState {
        TableState {
            board: self.board.clone(),
            counters: self.counters.clone(),
            players: self.players.clone(),
            stack_zone_positions: self.stack_zone_positions.clone(),
        }
    }
}

/// Error notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Human-readable description.
    pub message: String,
}
