//! Error types for tablesync peers.

use tablesync_types::{ChannelId, WireError};
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Another endpoint already listens on the address.
    #[error("address in use: {0}")]
    AddressInUse(String),

    /// Nobody listens on the address.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The channel was closed (by either side).
    #[error("channel {0} closed")]
    ChannelClosed(ChannelId),

    /// The channel exists but has not reported open yet.
    #[error("channel {0} not open")]
    NotOpen(ChannelId),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,

    /// I/O failure talking to the relay.
    #[error("i/o error: {0}")]
    Io(String),

    /// The relay sent something we did not expect.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

impl From<WireError> for TransportError {
    fn from(err: WireError) -> Self {
        TransportError::Protocol(err.to_string())
    }
}

/// Session errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Acting before being part of a room.
    #[error("must join a room first")]
    NotJoined,

    /// The host refused us.
    #[error("admission refused: {0}")]
    Admission(String),

    /// Transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Encoding failure.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// The session task is gone.
    #[error("session stopped")]
    Stopped,
}

/// Errors of the local resumable cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// File system failure.
    #[error("cache i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Corrupt or incompatible cache file.
    #[error("cache format error: {0}")]
    Json(#[from] serde_json::Error),
}
