//! Host election and epoch fencing.
//!
//! The successor of a departed host is the first remaining entry of the
//! last roster a peer observed. Rosters can briefly disagree during a
//! crash, so two peers may both believe they won; the room address admits
//! only one listener, and the loser rejoins as a client. Epochs fence off
//! snapshots from a host that has since been replaced.

use tablesync_types::{Player, PlayerId};

/// What a peer does after losing its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Succession {
    /// Open the room address and take over.
    BecomeHost,
    /// Dial the room address until the new host answers.
    Rejoin,
}

/// The elected successor: the first roster entry that is not `departed`.
pub fn successor<'a>(roster: &'a [Player], departed: &PlayerId) -> Option<&'a Player> {
    roster.iter().find(|p| &p.id != departed)
}

/// Roster handed to the successor: everyone except the outgoing host.
pub fn handover_roster(roster: &[Player], outgoing: &PlayerId) -> Vec<Player> {
    roster.iter().filter(|p| &p.id != outgoing).cloned().collect()
}

/// Decide the succession for `me` after `departed` vanished.
///
/// A peer takes over only if it is first in line and at least one other
/// player remains to be hosted. A lone survivor keeps dialing and gives up
/// when the migration deadline passes.
pub fn on_host_lost(roster: &[Player], me: &PlayerId, departed: &PlayerId) -> Succession {
    let remaining = handover_roster(roster, departed);
    let first = remaining.first().map(|p| &p.id);
    if first == Some(me) && remaining.len() > 1 {
        Succession::BecomeHost
    } else {
        Succession::Rejoin
    }
}

/// Tracks the highest host epoch a peer has seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpochFence {
    highest: u64,
}

impl EpochFence {
    /// Fence starting at `epoch`.
    pub fn new(epoch: u64) -> Self {
        Self { highest: epoch }
    }

    /// Highest epoch seen.
    pub fn current(&self) -> u64 {
        self.highest
    }

    /// Epoch a successor of the current host hosts under.
    pub fn next(&self) -> u64 {
        self.highest.saturating_add(1)
    }

    /// Record `epoch`; returns `false` if it belongs to a replaced host.
    pub fn observe(&mut self, epoch: u64) -> bool {
        if epoch < self.highest {
            return false;
        }
        self.highest = epoch;
        true
    }
}
