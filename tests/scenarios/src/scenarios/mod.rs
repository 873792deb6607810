//! End-to-end scenarios.
//!
//! - `admission` - joining, wrong passwords, duplicate joins
//! - `routing` - requests reaching the host and every mirror
//! - `migration` - host crash and voluntary handover
//! - `resume` - restarting from the local snapshot
//! - `commander` - commander death tracking across the wire

pub mod admission;
pub mod commander;
pub mod migration;
pub mod resume;
pub mod routing;
