//! Host migration coordinator.
//!
//! When a client loses its host, either to a crash (the channel closed) or
//! to a planned handover (`host-transfer`), it builds a [`MigrationPlan`]:
//! whether it should take over, which table and epoch the new host starts
//! from, and the deadline after which the room is considered lost.
//!
//! The elected successor listens on the room id. Everyone else dials it,
//! retrying until the successor answers. A successor whose listen is refused
//! dials instead: another peer won the address.

use tablesync_core::{handover_roster, on_host_lost, EpochFence, Succession};
use tablesync_types::{HostTransfer, PlayerId, TableState};
use tokio::time::{Duration, Instant};

/// Why the host went away.
#[derive(Debug, Clone, PartialEq)]
pub enum Cause {
    /// The channel to the host closed without warning.
    Crash,
    /// The host announced its successor.
    Handover(HostTransfer),
}

/// What one rejoin attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Try to open the room address; dial it if someone else holds it.
    Listen,
    /// Dial the room address.
    Dial,
}

/// An ongoing host migration.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationPlan {
    succession: Succession,
    seed: TableState,
    epoch: u64,
    deadline: Instant,
    departed: Option<PlayerId>,
}

impl MigrationPlan {
    /// Plan the migration for `me`, given the last mirror it holds.
    pub fn begin(
        me: &PlayerId,
        mirror: &TableState,
        fence: EpochFence,
        cause: Cause,
        now: Instant,
        timeout: Duration,
    ) -> Self {
        let deadline = now + timeout;
        match cause {
            Cause::Handover(transfer) => {
                let succession = if &transfer.new_host_id == me {
                    Succession::BecomeHost
                } else {
                    Succession::Rejoin
                };
                Self {
                    succession,
                    seed: transfer.table(),
                    epoch: transfer.epoch,
                    deadline,
                    departed: None,
                }
            }
            Cause::Crash => {
                // The host always heads the roster it broadcasts.
                let departed = mirror.players.first().map(|p| p.id.clone());
                let (succession, players) = match &departed {
                    Some(host) if host != me => (
                        on_host_lost(&mirror.players, me, host),
                        handover_roster(&mirror.players, host),
                    ),
                    _ => (Succession::Rejoin, mirror.players.clone()),
                };
                Self {
                    succession,
                    seed: TableState {
                        players,
                        ..mirror.clone()
                    },
                    epoch: fence.next(),
                    deadline,
                    departed,
                }
            }
        }
    }

    /// Whether this peer was elected.
    pub fn succession(&self) -> Succession {
        self.succession
    }

    /// What the next attempt does.
    pub fn step(&self) -> Step {
        match self.succession {
            Succession::BecomeHost => Step::Listen,
            Succession::Rejoin => Step::Dial,
        }
    }

    /// Table the new host starts from.
    pub fn seed(&self) -> &TableState {
        &self.seed
    }

    /// Epoch the new host serves.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// When the migration gives up.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// The host that went away, when known.
    pub fn departed(&self) -> Option<&PlayerId> {
        self.departed.as_ref()
    }

    /// Whether a snapshot of `epoch` comes from the new host.
    pub fn completed_by(&self, epoch: u64) -> bool {
        epoch >= self.epoch
    }
}
