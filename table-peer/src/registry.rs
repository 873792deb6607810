//! Connection registry.
//!
//! The registry is the only owner of transport channels: everything else
//! sends, broadcasts and closes through it. It remembers which player sits
//! behind each channel and whether the channel has reported open yet.

use std::collections::BTreeMap;
use std::sync::Arc;

use tablesync_types::{ChannelId, JoinMetadata, Message, PlayerId};

use crate::transport::Transport;
use crate::TransportError;

/// What we know about the peer behind a channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeerInfo {
    /// Player id presented at join time, once known.
    pub player_id: Option<PlayerId>,
    /// Display name presented at join time, once known.
    pub display_name: Option<String>,
    /// Whether the channel reported open.
    pub open: bool,
    /// Whether the remote side dialed us.
    pub inbound: bool,
}

/// Owner of every channel of one transport.
#[derive(Debug)]
pub struct ConnectionRegistry<T: Transport> {
    transport: Arc<T>,
    peers: BTreeMap<ChannelId, PeerInfo>,
}

impl<T: Transport> ConnectionRegistry<T> {
    /// Create a registry over a transport.
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            peers: BTreeMap::new(),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Remember a channel we dialed; it is not usable until `on_opened`.
    pub fn track_dial(&mut self, channel: ChannelId) {
        self.peers.entry(channel).or_default();
    }

    /// Record that a channel reported open.
    pub fn on_opened(
        &mut self,
        channel: ChannelId,
        metadata: Option<&JoinMetadata>,
        inbound: bool,
    ) {
        let peer = self.peers.entry(channel).or_default();
        peer.open = true;
        peer.inbound = inbound;
        if let Some(meta) = metadata {
            peer.player_id = Some(meta.player_id.clone());
            peer.display_name = Some(meta.display_name.clone());
        }
    }

    /// Forget a channel the remote side closed.
    pub fn on_closed(&mut self, channel: ChannelId) -> Option<PeerInfo> {
        self.peers.remove(&channel)
    }

    /// What we know about a channel.
    pub fn peer(&self, channel: ChannelId) -> Option<&PeerInfo> {
        self.peers.get(&channel)
    }

    /// Whether a channel is open and usable.
    pub fn is_open(&self, channel: ChannelId) -> bool {
        self.peers.get(&channel).is_some_and(|p| p.open) && self.transport.is_open(channel)
    }

    /// Open channel currently used by `player`, if any.
    pub fn channel_for(&self, player: &PlayerId) -> Option<ChannelId> {
        self.peers
            .iter()
            .find(|(_, peer)| peer.open && peer.player_id.as_ref() == Some(player))
            .map(|(channel, _)| *channel)
    }

    /// Every channel that reported open.
    pub fn open_channels(&self) -> Vec<ChannelId> {
        self.peers
            .iter()
            .filter(|(_, peer)| peer.open)
            .map(|(channel, _)| *channel)
            .collect()
    }

    /// Send a message on one channel.
    ///
    /// A closed or not-yet-open channel is a delivery failure: it is logged
    /// and reported, never retried.
    pub async fn send(&self, channel: ChannelId, message: &Message) -> Result<(), TransportError> {
        let bytes = message.to_bytes()?;
        self.send_bytes(channel, &bytes, message.kind()).await
    }

    /// Send a message to every open channel except `except`.
    ///
    /// Returns the number of channels the message was delivered to.
    pub async fn broadcast(&self, message: &Message, except: Option<ChannelId>) -> usize {
        let bytes = match message.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to encode {}: {}", message.kind(), e);
                return 0;
            }
        };

        let mut delivered = 0;
        for channel in self.open_channels() {
            if Some(channel) == except {
                continue;
            }
            if self.send_bytes(channel, &bytes, message.kind()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    async fn send_bytes(
        &self,
        channel: ChannelId,
        bytes: &[u8],
        kind: &str,
    ) -> Result<(), TransportError> {
        if !self.is_open(channel) {
            tracing::warn!("Dropping {} for channel {}: not open", kind, channel);
            return Err(TransportError::NotOpen(channel));
        }
        match self.transport.send(channel, bytes).await {
            Ok(()) => {
                tracing::debug!("Sent {} ({} bytes) on channel {}", kind, bytes.len(), channel);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Delivery of {} on channel {} failed: {}", kind, channel, e);
                Err(e)
            }
        }
    }

    /// Close a channel and forget it.
    pub async fn close(&mut self, channel: ChannelId) -> Option<PeerInfo> {
        let peer = self.peers.remove(&channel);
        if let Err(e) = self.transport.close(channel).await {
            tracing::debug!("Closing channel {}: {}", channel, e);
        }
        peer
    }

    /// Close every channel and stop the transport.
    pub async fn shutdown(&mut self) {
        self.peers.clear();
        self.transport.shutdown().await;
    }
}
