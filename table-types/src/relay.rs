//! Frames exchanged between a peer endpoint and the rendezvous relay.
//!
//! The relay never looks inside `payload`: it only maps logical addresses
//! to endpoints and forwards channel traffic between them.

use serde::{Deserialize, Serialize};

use crate::{ChannelId, JoinMetadata, WireError};

/// Maximum encoded frame size accepted by either side (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// All relay frames, in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum RelayFrame {
    /// Endpoint → relay: claim a logical address.
    Listen {
        /// Correlates the reply.
        request: u64,
        /// Address to claim (a room id).
        address: String,
    },
    /// Endpoint → relay: give up a logical address.
    Unlisten {
        /// Address to release.
        address: String,
    },
    /// Endpoint → relay: open a channel to whoever listens on `address`.
    Dial {
        /// Correlates the reply.
        request: u64,
        /// Target address.
        address: String,
        /// Join metadata handed to the listener.
        metadata: JoinMetadata,
    },
    /// Endpoint → relay: forward a payload on a channel.
    Send {
        /// Channel to send on.
        channel: ChannelId,
        /// Opaque payload.
        payload: Vec<u8>,
    },
    /// Endpoint → relay: close a channel.
    Close {
        /// Channel to close.
        channel: ChannelId,
    },
    /// Relay → endpoint: request succeeded.
    Ack {
        /// Request being answered.
        request: u64,
        /// Channel allocated by a dial.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<ChannelId>,
    },
    /// Relay → endpoint: request failed.
    Refused {
        /// Request being answered.
        request: u64,
        /// Why it failed.
        reason: Refusal,
    },
    /// Relay → endpoint: a channel is ready for traffic.
    Opened {
        /// The channel.
        channel: ChannelId,
        /// Dialer's join metadata (present on the listening side).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<JoinMetadata>,
        /// Whether the remote side dialed us.
        inbound: bool,
    },
    /// Relay → endpoint: payload received on a channel.
    Data {
        /// The channel.
        channel: ChannelId,
        /// Opaque payload.
        payload: Vec<u8>,
    },
    /// Relay → endpoint: the other side closed or vanished.
    Closed {
        /// The channel.
        channel: ChannelId,
        /// Human-readable reason.
        reason: String,
    },
}

/// Why the relay refused a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Refusal {
    /// Another endpoint already listens on the address.
    AddressInUse,
    /// Nobody listens on the address.
    Unreachable,
    /// The endpoint has too many open channels.
    TooManyChannels,
}

impl RelayFrame {
    /// Serialize to MessagePack bytes (named fields).
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec_named(self).map_err(WireError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        rmp_serde::from_slice(bytes).map_err(WireError::Deserialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlayerId;

    #[test]
    fn data_frame_roundtrip() {
        let frame = RelayFrame::Data {
            channel: ChannelId::new(9),
            payload: vec![1, 2, 3, 255],
        };
        let restored = RelayFrame::from_bytes(&frame.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, frame);
    }

    #[test]
    fn dial_frame_roundtrip() {
        let frame = RelayFrame::Dial {
            request: 4,
            address: "R1".into(),
            metadata: JoinMetadata {
                password: "pw".into(),
                display_name: "Alice".into(),
                player_id: PlayerId::new("alice"),
            },
        };
        let restored = RelayFrame::from_bytes(&frame.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, frame);
    }

    #[test]
    fn refused_frame_roundtrip() {
        let frame = RelayFrame::Refused {
            request: 1,
            reason: Refusal::AddressInUse,
        };
        let restored = RelayFrame::from_bytes(&frame.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, frame);
    }
}
