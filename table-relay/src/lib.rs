//! # tablesync-relay
//!
//! Rendezvous relay for tablesync peers.
//!
//! Peers rarely accept inbound connections directly, so they meet here:
//! - An endpoint **listens** on a logical address (a room id); at most one
//!   endpoint holds an address at a time
//! - Another endpoint **dials** the address and gets a channel to it, with
//!   its join metadata handed to the listener
//! - Channel payloads are forwarded opaque (the relay is a "dumb pipe")
//! - When an endpoint disconnects, its addresses are released and the other
//!   side of each of its channels is told
//!
//! ## Architecture
//!
//! ```text
//! Host (listens "R1") ──┐                 ┌── Peer (dials "R1")
//!                       │   TCP, framed   │
//!                   ┌───┴─────────────────┴───┐
//!                   │     tablesync-relay     │
//!                   │  addresses  channels    │
//!                   └─────────────────────────┘
//! ```
//!
//! Frames are MessagePack-encoded `RelayFrame`s with a 4-byte big-endian
//! length prefix.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod connection;
pub mod error;
pub mod server;

pub use config::{Config, ConfigError};
pub use connection::serve;
pub use error::{ProtocolError, RelayError};
pub use server::{EndpointId, Relay, RelayMetrics};
