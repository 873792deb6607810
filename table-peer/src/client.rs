//! Client request router.
//!
//! On a non-host peer, local intents become `request-action` messages for
//! the host, and host snapshots replace the local mirror wholesale. Fields a
//! snapshot leaves out are kept from the previous mirror. Snapshots from a
//! host older than the newest epoch seen are ignored.

use rand::rngs::StdRng;
use tablesync_core::EpochFence;
use tablesync_types::{
    Action, BoardState, HostTransfer, Message, PlayerId, RequestAction, RoomState, TableState,
};

/// What an inbound host message meant for the mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientUpdate {
    /// A snapshot replaced (parts of) the mirror.
    Snapshot {
        /// Epoch of the snapshot.
        epoch: u64,
        /// Whether the roster was part of it.
        roster: bool,
    },
    /// A snapshot from a replaced host was dropped.
    Stale {
        /// Epoch of the dropped snapshot.
        epoch: u64,
    },
    /// The host announced a handover.
    Handover(HostTransfer),
    /// The host refused us.
    Rejected(String),
    /// Nothing a client acts on.
    Ignored,
}

/// The non-host side of a room.
#[derive(Debug)]
pub struct ClientRouter {
    me: PlayerId,
    mirror: TableState,
    fence: EpochFence,
    rng: StdRng,
}

impl ClientRouter {
    /// Start with an existing mirror (empty for a fresh join).
    pub fn new(me: PlayerId, mirror: TableState, fence: EpochFence, rng: StdRng) -> Self {
        Self {
            me,
            mirror,
            fence,
            rng,
        }
    }

    /// The local mirror of the host's table.
    pub fn table(&self) -> &TableState {
        &self.mirror
    }

    /// Highest host epoch seen.
    pub fn fence(&self) -> EpochFence {
        self.fence
    }

    /// Consume the router, keeping the mirror and epoch fence.
    pub fn into_parts(self) -> (TableState, EpochFence, StdRng) {
        (self.mirror, self.fence, self.rng)
    }

    /// Build the request for `action` without touching the mirror.
    pub fn request(&self, action: &Action) -> Message {
        Message::RequestAction(RequestAction {
            action: action.clone(),
            actor_id: self.me.clone(),
        })
    }

    /// Echo a positional drag into the mirror once its request is sent.
    ///
    /// The host's next snapshot overwrites the guess. Returns whether the
    /// mirror changed.
    pub fn echo(&mut self, action: &Action) -> bool {
        if !action.is_optimistic() {
            return false;
        }
        let outcome = tablesync_core::apply(&self.mirror, action, &mut self.rng);
        let echoed = outcome.is_applied();
        self.mirror = outcome.into_state(&self.mirror);
        echoed
    }

    /// Apply a message from the host.
    pub fn on_message(&mut self, message: Message) -> ClientUpdate {
        match message {
            Message::RoomState(room) => self.apply_room(room),
            Message::BoardState(board) => self.apply_board(board),
            Message::HostTransfer(transfer) => {
                if !self.fence.observe(transfer.epoch) {
                    tracing::debug!("Ignoring stale host transfer (epoch {})", transfer.epoch);
                    return ClientUpdate::Stale {
                        epoch: transfer.epoch,
                    };
                }
                self.mirror = transfer.table();
                ClientUpdate::Handover(transfer)
            }
            Message::Error(error) => ClientUpdate::Rejected(error.message),
            Message::RequestAction(_) => ClientUpdate::Ignored,
        }
    }

    fn apply_room(&mut self, room: RoomState) -> ClientUpdate {
        if !self.fence.observe(room.epoch) {
            tracing::debug!("Ignoring stale room-state (epoch {})", room.epoch);
            return ClientUpdate::Stale { epoch: room.epoch };
        }
        let roster = room.players.is_some();
        if let Some(board) = room.board {
            self.mirror.board = board;
        }
        if let Some(counters) = room.counters {
            self.mirror.counters = counters;
        }
        if let Some(players) = room.players {
            self.mirror.players = players;
        }
        if let Some(positions) = room.stack_zone_positions {
            self.mirror.stack_zone_positions = positions;
        }
        ClientUpdate::Snapshot {
            epoch: room.epoch,
            roster,
        }
    }

    fn apply_board(&mut self, board: BoardState) -> ClientUpdate {
        if !self.fence.observe(board.epoch) {
            tracing::debug!("Ignoring stale board-state (epoch {})", board.epoch);
            return ClientUpdate::Stale { epoch: board.epoch };
        }
        if let Some(cards) = board.board {
            self.mirror.board = cards;
        }
        if let Some(counters) = board.counters {
            self.mirror.counters = counters;
        }
        if let Some(positions) = board.stack_zone_positions {
            self.mirror.stack_zone_positions = positions;
        }
        ClientUpdate::Snapshot {
            epoch: board.epoch,
            roster: false,
        }
    }
}
