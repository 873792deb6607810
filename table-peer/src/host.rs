//! Host action processor.
//!
//! The host owns the canonical table. It admits peers (password check),
//! applies requested actions one at a time through the reducer and pushes
//! full snapshots to everyone after each accepted change. Broadcasting full
//! snapshots means a peer that missed one message is corrected by the next.

use rand::rngs::StdRng;
use tablesync_core::{handover_roster, successor, IgnoreReason, Outcome};
use tablesync_types::{
    Action, BoardState, ChannelId, HostTransfer, JoinMetadata, Message, Player, PlayerId,
    RoomState, TableState,
};

use crate::registry::ConnectionRegistry;
use crate::transport::Transport;

/// Message sent to a peer that presented the wrong room password.
pub const INVALID_PASSWORD: &str = "invalid room password";

/// Result of an inbound connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The peer is in the roster and has its snapshot.
    Admitted {
        /// The admitted player.
        player_id: PlayerId,
        /// Whether the player was already in the roster.
        rejoined: bool,
    },
    /// The peer was refused and its channel closed.
    Rejected {
        /// Player id the peer claimed, if any.
        player_id: Option<PlayerId>,
    },
}

/// The host side of a room.
#[derive(Debug)]
pub struct HostProcessor {
    password: String,
    me: PlayerId,
    table: TableState,
    epoch: u64,
    rng: StdRng,
}

impl HostProcessor {
    /// Start hosting `table` under `epoch`.
    ///
    /// The host is always first in the roster; it is added (or moved to the
    /// front) if needed.
    pub fn new(
        password: impl Into<String>,
        me: Player,
        mut table: TableState,
        epoch: u64,
        rng: StdRng,
    ) -> Self {
        match table.players.iter().position(|p| p.id == me.id) {
            Some(0) => {}
            Some(i) => {
                let entry = table.players.remove(i);
                table.players.insert(0, entry);
            }
            None => table.players.insert(0, me.clone()),
        }
        Self {
            password: password.into(),
            me: me.id,
            table,
            epoch,
            rng,
        }
    }

    /// The canonical table.
    pub fn table(&self) -> &TableState {
        &self.table
    }

    /// Consume the processor, keeping the table.
    pub fn into_table(self) -> TableState {
        self.table
    }

    /// Epoch this host serves.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Full room snapshot.
    pub fn room_state(&self) -> Message {
        Message::RoomState(RoomState::full(self.epoch, &self.table))
    }

    /// Board-only snapshot.
    pub fn board_state(&self) -> Message {
        Message::BoardState(BoardState::full(self.epoch, &self.table))
    }

    /// Handle a channel that reported open.
    ///
    /// Checks the password, registers the player in the roster, sends the
    /// joiner the full room and rebroadcasts the roster to everyone else.
    pub async fn on_peer_opened<T: Transport>(
        &mut self,
        registry: &mut ConnectionRegistry<T>,
        channel: ChannelId,
        metadata: Option<JoinMetadata>,
    ) -> Admission {
        let Some(meta) = metadata else {
            tracing::warn!("Channel {} opened without join metadata, closing", channel);
            registry.close(channel).await;
            return Admission::Rejected { player_id: None };
        };

        if meta.password != self.password {
            tracing::warn!(
                "Rejecting {} ({}) on channel {}: {}",
                meta.display_name,
                meta.player_id,
                channel,
                INVALID_PASSWORD
            );
            registry.on_opened(channel, Some(&meta), true);
            let _ = registry.send(channel, &Message::error(INVALID_PASSWORD)).await;
            registry.close(channel).await;
            return Admission::Rejected {
                player_id: Some(meta.player_id),
            };
        }

        // A player that joins again replaces its older channel.
        if let Some(old) = registry.channel_for(&meta.player_id) {
            tracing::info!("Player {} rejoined, dropping channel {}", meta.player_id, old);
            registry.close(old).await;
        }
        registry.on_opened(channel, Some(&meta), true);

        let rejoined = self.table.player(&meta.player_id).is_some();
        if !rejoined {
            self.table
                .players
                .push(Player::new(meta.player_id.clone(), meta.display_name.clone()));
        }
        tracing::info!(
            "Admitted {} ({}) on channel {}, {} players",
            meta.display_name,
            meta.player_id,
            channel,
            self.table.players.len()
        );

        let room = self.room_state();
        let _ = registry.send(channel, &room).await;
        registry.broadcast(&room, Some(channel)).await;

        Admission::Admitted {
            player_id: meta.player_id,
            rejoined,
        }
    }

    /// Handle a payload from a peer.
    ///
    /// Undecodable payloads are dropped at this boundary and never reach the
    /// reducer. A processed request yields its action kind and outcome.
    pub async fn on_message<T: Transport>(
        &mut self,
        registry: &mut ConnectionRegistry<T>,
        channel: ChannelId,
        bytes: &[u8],
    ) -> Option<(&'static str, Result<(), IgnoreReason>)> {
        let message = match Message::from_bytes(bytes) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Dropping undecodable payload on channel {}: {}", channel, e);
                return None;
            }
        };

        match message {
            Message::RequestAction(request) => {
                let sender = registry.peer(channel).and_then(|p| p.player_id.clone());
                if sender.is_none() {
                    tracing::warn!("Request from unadmitted channel {}", channel);
                    return None;
                }
                tracing::debug!(
                    "Request {} from {} on channel {}",
                    request.action.kind(),
                    request.actor_id,
                    channel
                );
                Some((request.action.kind(), self.apply(registry, &request.action).await))
            }
            other => {
                tracing::debug!("Ignoring {} from channel {}", other.kind(), channel);
                None
            }
        }
    }

    /// Apply one action and broadcast the result.
    ///
    /// Board-only changes go out as `board-state`; roster changes (life
    /// totals) as a full `room-state`.
    pub async fn apply<T: Transport>(
        &mut self,
        registry: &mut ConnectionRegistry<T>,
        action: &Action,
    ) -> Result<(), IgnoreReason> {
        match tablesync_core::apply(&self.table, action, &mut self.rng) {
            Outcome::Applied {
                state,
                roster_changed,
            } => {
                self.table = state;
                let snapshot = if roster_changed {
                    self.room_state()
                } else {
                    self.board_state()
                };
                let delivered = registry.broadcast(&snapshot, None).await;
                tracing::debug!("Applied {}, snapshot sent to {} peers", action.kind(), delivered);
                Ok(())
            }
            Outcome::Ignored(reason) => {
                tracing::debug!("Ignored {}: {}", action.kind(), reason);
                Err(reason)
            }
        }
    }

    /// Handle a channel the remote side closed.
    ///
    /// Returns the player that left the roster, if any.
    pub async fn on_peer_closed<T: Transport>(
        &mut self,
        registry: &mut ConnectionRegistry<T>,
        player_id: Option<PlayerId>,
    ) -> Option<PlayerId> {
        let player = player_id?;
        // Still reachable on a newer channel.
        if registry.channel_for(&player).is_some() || player == self.me {
            return None;
        }
        let before = self.table.players.len();
        self.table.players.retain(|p| p.id != player);
        if self.table.players.len() == before {
            return None;
        }
        tracing::info!("Player {} left, {} remain", player, self.table.players.len());
        registry.broadcast(&self.room_state(), None).await;
        Some(player)
    }

    /// Drop roster entries with no open channel.
    ///
    /// Used after a migration, once the peers that are coming back have had
    /// time to reconnect.
    pub async fn prune_absent<T: Transport>(
        &mut self,
        registry: &mut ConnectionRegistry<T>,
    ) -> Vec<PlayerId> {
        let absent: Vec<PlayerId> = self
            .table
            .players
            .iter()
            .filter(|p| p.id != self.me && registry.channel_for(&p.id).is_none())
            .map(|p| p.id.clone())
            .collect();
        if !absent.is_empty() {
            self.table.players.retain(|p| !absent.contains(&p.id));
            tracing::info!("Pruned {} players that did not return", absent.len());
            registry.broadcast(&self.room_state(), None).await;
        }
        absent
    }

    /// Announce a planned handover to every peer.
    ///
    /// Returns the elected successor, or `None` when nobody is left.
    pub async fn hand_over<T: Transport>(
        &self,
        registry: &mut ConnectionRegistry<T>,
    ) -> Option<PlayerId> {
        let next = successor(&self.table.players, &self.me)?.id.clone();
        let transfer_epoch = self.epoch.saturating_add(1);
        let transfer = HostTransfer {
            new_host_id: next.clone(),
            epoch: transfer_epoch,
            board: self.table.board.clone(),
            counters: self.table.counters.clone(),
            players: handover_roster(&self.table.players, &self.me),
            stack_zone_positions: self.table.stack_zone_positions.clone(),
        };
        let delivered = registry
            .broadcast(&Message::HostTransfer(transfer), None)
            .await;
        tracing::info!(
            "Handing room over to {} (epoch {}), told {} peers",
            next,
            transfer_epoch,
            delivered
        );
        Some(next)
    }
}
