//! # scenario-tests
//!
//! Multi-peer scenarios for tablesync.
//!
//! Every scenario runs complete sessions over the in-process
//! `MemoryNetwork`, so rooms, crashes and migrations are exercised without
//! sockets:
//! - Admission and the first snapshot
//! - Request routing and broadcast
//! - Host crash and voluntary handover
//! - Resuming from the local snapshot

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assertions;
pub mod harness;

pub mod scenarios;
