//! # tablesync-core
//!
//! Pure logic for tablesync (no I/O, instant tests).
//!
//! This crate implements the rules of the shared table and the state
//! machines of a room membership without any network or disk I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. Randomness (shuffles, random library placement) is
//! passed in as an `Rng`, so a seeded generator makes every result
//! reproducible.
//!
//! The actual I/O (transports, timers) is performed by `tablesync-peer`,
//! which interprets the effects produced by these state machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod election;
pub mod reducer;
pub mod retry;
pub mod state;

pub use election::{handover_roster, on_host_lost, successor, EpochFence, Succession};
pub use reducer::{apply, reduce, reindex_hand, IgnoreReason, Outcome};
pub use retry::RetryPolicy;
pub use state::{ConnectionState, Effect, Event, LinkEvent, Role};
