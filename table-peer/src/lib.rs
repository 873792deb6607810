//! # tablesync-peer
//!
//! Peer library for the tablesync shared game board.
//!
//! A room has one host holding the canonical table and any number of
//! clients mirroring it. This crate provides every part a peer needs:
//!
//! - **Transports**: the [`Transport`] trait, an in-process
//!   [`MemoryNetwork`] and a [`RelayTransport`] speaking to `tablesync-relay`
//! - **[`ConnectionRegistry`]**: sole owner of the channels of a transport
//! - **[`HostProcessor`]**: admission, reducer, snapshot broadcast
//! - **[`ClientRouter`]**: request forwarding and mirror replacement
//! - **[`MigrationPlan`]**: electing and reaching a new host
//! - **[`Session`]**: the actor tying it together, driven by the pure
//!   state machine of `tablesync-core`
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tablesync_peer::{MemoryNetwork, Session, SessionConfig};
//!
//! let network = MemoryNetwork::new();
//! let host = Session::host(Arc::new(network.endpoint()), SessionConfig::new("R1", "pw", "Ann"));
//! let peer = Session::join(Arc::new(network.endpoint()), SessionConfig::new("R1", "pw", "Bo"));
//!
//! peer.request(action).await?;
//! let view = peer.view();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod migration;
pub mod registry;
pub mod session;
pub mod transport;

pub use cache::ResumableSession;
pub use client::{ClientRouter, ClientUpdate};
pub use config::{SessionConfig, DEFAULT_EVENT_CAPACITY, DEFAULT_MIGRATION_TIMEOUT};
pub use error::{CacheError, SessionError, TransportError};
pub use host::{Admission, HostProcessor, INVALID_PASSWORD};
pub use migration::{Cause, MigrationPlan, Step};
pub use registry::{ConnectionRegistry, PeerInfo};
pub use session::{Session, SessionEvent, SessionHandle, SessionView, Start};
pub use transport::{MemoryNetwork, MemoryTransport, RelayTransport, Transport, TransportEvent};

// Re-exported so applications need a single dependency.
pub use tablesync_core::{ConnectionState, IgnoreReason, RetryPolicy, Role};
