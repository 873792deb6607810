//! Transport abstraction for tablesync.
//!
//! A transport carries opaque byte payloads over persistent, ordered,
//! reliable channels between peers, addressed by logical names (room ids).
//!
//! # Design
//!
//! The transport trait is async and event-driven:
//! - `listen()` claims an address; at most one endpoint may hold it
//! - `dial()` initiates a channel and returns its id immediately
//! - `next_event()` reports `Opened`, `Data` and `Closed` per channel
//! - `send()` / `close()` act on one channel
//!
//! A dialed channel must not be written to before its `Opened` event; the
//! listening side learns the dialer's [`JoinMetadata`] from that event.
//!
//! # Example
//!
//! ```ignore
//! let network = MemoryNetwork::new();
//! let host = network.endpoint();
//! let peer = network.endpoint();
//! host.listen("R1").await?;
//! let channel = peer.dial("R1", metadata).await?;
//! // wait for TransportEvent::Opened { channel, .. } before sending
//! ```

mod memory;
mod relay;

pub use memory::{MemoryNetwork, MemoryTransport};
pub use relay::RelayTransport;

use async_trait::async_trait;
use tablesync_types::{ChannelId, JoinMetadata};

use crate::TransportError;

/// Something that happened on a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A channel is ready for traffic.
    Opened {
        /// The channel.
        channel: ChannelId,
        /// Dialer's join metadata (present on the listening side).
        metadata: Option<JoinMetadata>,
        /// Whether the remote side dialed us.
        inbound: bool,
    },
    /// A payload arrived.
    Data {
        /// The channel.
        channel: ChannelId,
        /// Opaque payload.
        bytes: Vec<u8>,
    },
    /// The remote side closed the channel or vanished.
    Closed {
        /// The channel.
        channel: ChannelId,
        /// Human-readable reason.
        reason: String,
    },
}

/// Transport trait for peer channels.
///
/// Implementations handle the underlying connection mechanism
/// (in-process for tests, TCP via the relay, etc).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Claim a logical address so other endpoints can dial it.
    async fn listen(&self, address: &str) -> Result<(), TransportError>;

    /// Release an address claimed with `listen`.
    async fn unlisten(&self, address: &str) -> Result<(), TransportError>;

    /// Initiate a channel to whoever listens on `address`.
    ///
    /// Returns as soon as the channel exists; it is usable once the
    /// matching `Opened` event arrives.
    async fn dial(&self, address: &str, metadata: JoinMetadata)
        -> Result<ChannelId, TransportError>;

    /// Send bytes over an open channel.
    async fn send(&self, channel: ChannelId, bytes: &[u8]) -> Result<(), TransportError>;

    /// Check if a channel is currently open.
    fn is_open(&self, channel: ChannelId) -> bool;

    /// Close a channel. The remote side receives `Closed`.
    async fn close(&self, channel: ChannelId) -> Result<(), TransportError>;

    /// Close every channel and release every address.
    async fn shutdown(&self);

    /// Wait for the next event; `None` once the transport is shut down.
    async fn next_event(&self) -> Option<TransportEvent>;
}
