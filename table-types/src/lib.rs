//! # table-types
//!
//! Wire format types for the tablesync shared game board protocol.
//!
//! This crate provides the foundational types used across all tablesync crates:
//! - [`PlayerId`], [`CardId`], [`CounterId`], [`RoomId`], [`ChannelId`] - Identity types
//! - [`Card`], [`Counter`], [`Player`], [`TableState`] - The shared board model
//! - [`Action`] - Board mutations requested by peers
//! - [`Message`] - Protocol messages (request-action, room-state, host-transfer, ...)
//! - [`RelayFrame`] - Frames spoken with the rendezvous relay
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod action;
mod error;
mod ids;
mod messages;
mod model;
mod relay;

pub use action::{Action, LibraryPlace};
pub use error::WireError;
pub use ids::{CardId, ChannelId, CounterId, PlayerId, RoomId};
pub use messages::{
    BoardState, ErrorMessage, HostTransfer, JoinMetadata, Message, RequestAction, RoomState,
};
pub use model::{
    Card, CardMetadata, Counter, CounterKind, Player, Position, StackZonePositions, TableState,
    Zone, STARTING_LIFE,
};
pub use relay::{Refusal, RelayFrame, MAX_FRAME_SIZE};
