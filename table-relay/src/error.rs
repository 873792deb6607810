//! Error types for tablesync-relay.

use tablesync_types::WireError;

/// Main error type for relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors of one endpoint connection.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Frame larger than the configured limit.
    #[error("frame too large: {size} bytes (limit: {limit} bytes)")]
    FrameTooLarge {
        /// Announced size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Frame failed to decode or encode.
    #[error("invalid frame: {0}")]
    Wire(#[from] WireError),

    /// Connection failure.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
