//! Connection state machine for a room membership.
//!
//! This module provides a pure, side-effect-free state machine for the
//! lifecycle `idle → initializing → connected`, with `waiting` while a lost
//! host is being replaced and `error` for unrecoverable failures. The state
//! machine takes events as input and produces a new state plus a list of
//! effects to execute.
//!
//! The actual I/O (listening, dialing, timers) is performed by the peer
//! session, not by this module.

/// Which side of the room this peer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Holds write authority over the table.
    Host,
    /// Mirrors the host's table.
    Client,
}

/// Connection state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not part of any room.
    #[default]
    Idle,
    /// Opening the room (host) or dialing it (client).
    Initializing {
        /// Role being established.
        role: Role,
    },
    /// The host is gone; electing or reaching its successor.
    Waiting {
        /// Failed rejoin attempts so far.
        attempt: u32,
    },
    /// Part of the room.
    Connected {
        /// Current role.
        role: Role,
    },
    /// Unrecoverable failure.
    Error {
        /// Human-readable description.
        message: String,
    },
}

impl ConnectionState {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus effects to execute.
    pub fn on_event(self, event: Event) -> (Self, Vec<Effect>) {
        match (self, event) {
            // Leaving always wins.
            (Self::Idle, Event::LeaveRequested) => (Self::Idle, vec![]),
            (_, Event::LeaveRequested) => (
                Self::Idle,
                vec![Effect::CancelRetry, Effect::Shutdown, Effect::Emit(LinkEvent::Left)],
            ),

            // From Idle
            (Self::Idle, Event::HostRequested) => (
                Self::Initializing { role: Role::Host },
                vec![Effect::Listen],
            ),
            (Self::Idle, Event::JoinRequested) => (
                Self::Initializing { role: Role::Client },
                vec![Effect::Dial],
            ),

            // From Initializing
            (Self::Initializing { role: Role::Host }, Event::Listening) => connected(Role::Host),
            (Self::Initializing { role: Role::Client }, Event::HostReached) => {
                connected(Role::Client)
            }
            (Self::Initializing { .. }, Event::AttemptFailed { error }) => failed(error),

            // From Connected (client side)
            (Self::Connected { role: Role::Client }, Event::HostLost { reason }) => (
                Self::Waiting { attempt: 0 },
                vec![Effect::Emit(LinkEvent::HostLost { reason }), Effect::Rejoin],
            ),
            (Self::Connected { role: Role::Client }, Event::HandoverReceived) => (
                Self::Waiting { attempt: 0 },
                vec![
                    Effect::Emit(LinkEvent::HostLost {
                        reason: "host handed over".into(),
                    }),
                    Effect::Rejoin,
                ],
            ),

            // From Waiting
            (Self::Waiting { .. }, Event::Listening) => {
                let (state, mut effects) = connected(Role::Host);
                effects.insert(0, Effect::CancelRetry);
                (state, effects)
            }
            (Self::Waiting { .. }, Event::HostReached) => {
                let (state, mut effects) = connected(Role::Client);
                effects.insert(0, Effect::CancelRetry);
                (state, effects)
            }
            (Self::Waiting { attempt }, Event::AttemptFailed { error }) => {
                let next_attempt = attempt.saturating_add(1);
                (
                    Self::Waiting {
                        attempt: next_attempt,
                    },
                    vec![
                        Effect::Emit(LinkEvent::RejoinFailed {
                            attempt: next_attempt,
                            error,
                        }),
                        Effect::StartRetryTimer {
                            attempt: next_attempt,
                        },
                    ],
                )
            }
            // A freshly dialed channel can drop before the new host admits us.
            (Self::Waiting { attempt }, Event::HostLost { reason }) => {
                let next_attempt = attempt.saturating_add(1);
                (
                    Self::Waiting {
                        attempt: next_attempt,
                    },
                    vec![
                        Effect::Emit(LinkEvent::RejoinFailed {
                            attempt: next_attempt,
                            error: reason,
                        }),
                        Effect::StartRetryTimer {
                            attempt: next_attempt,
                        },
                    ],
                )
            }
            (Self::Waiting { attempt }, Event::RetryTimer) => {
                (Self::Waiting { attempt }, vec![Effect::Rejoin])
            }
            // A channel to a replaced host does not end the migration.
            (
                Self::Waiting { .. } | Self::Connected { role: Role::Client },
                Event::MigrationTimedOut,
            ) => {
                let (state, mut effects) = failed("host migration timed out".into());
                effects.insert(0, Effect::CancelRetry);
                (state, effects)
            }

            // Admission rejection ends the membership wherever it arrives.
            (
                Self::Initializing { .. } | Self::Connected { .. } | Self::Waiting { .. },
                Event::Rejected { message },
            ) => {
                let (state, mut effects) = failed(message);
                effects.insert(0, Effect::CancelRetry);
                effects.push(Effect::Shutdown);
                (state, effects)
            }

            // Nothing left to fail.
            (state @ (Self::Idle | Self::Error { .. }), Event::TransportFailed { .. }) => {
                (state, vec![])
            }
            (_, Event::TransportFailed { error }) => {
                let (state, mut effects) = failed(error);
                effects.insert(0, Effect::CancelRetry);
                (state, effects)
            }

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Whether this peer currently takes part in a room.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Whether this peer holds host authority.
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Connected { role: Role::Host })
    }

    /// Whether an attempt to reach the room is in progress.
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Initializing { .. } | Self::Waiting { .. })
    }

    /// Short name for logs and status lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing { .. } => "initializing",
            Self::Waiting { .. } => "waiting",
            Self::Connected { .. } => "connected",
            Self::Error { .. } => "error",
        }
    }
}

fn connected(role: Role) -> (ConnectionState, Vec<Effect>) {
    (
        ConnectionState::Connected { role },
        vec![Effect::Emit(LinkEvent::Connected { role })],
    )
}

fn failed(message: String) -> (ConnectionState, Vec<Effect>) {
    (
        ConnectionState::Error {
            message: message.clone(),
        },
        vec![Effect::Emit(LinkEvent::Failed { message })],
    )
}

/// Events that can occur in the membership lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// User asked to open a room.
    HostRequested,
    /// User asked to join a room.
    JoinRequested,
    /// Our listen on the room address succeeded.
    Listening,
    /// Our channel to the host reported open.
    HostReached,
    /// A listen or dial attempt failed.
    AttemptFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// The host refused us.
    Rejected {
        /// Message sent by the host.
        message: String,
    },
    /// Our channel to the host closed.
    HostLost {
        /// Reason for the close.
        reason: String,
    },
    /// The host announced a planned handover.
    HandoverReceived,
    /// Retry timer fired.
    RetryTimer,
    /// The migration deadline passed.
    MigrationTimedOut,
    /// User asked to leave.
    LeaveRequested,
    /// The transport itself broke.
    TransportFailed {
        /// Error message describing the failure.
        error: String,
    },
}

/// Effects to be executed by the session.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Listen on the room address.
    Listen,
    /// Dial the room address.
    Dial,
    /// Take part in host election and then listen or dial.
    Rejoin,
    /// Schedule a `RetryTimer` event.
    StartRetryTimer {
        /// Attempt number the delay is computed for.
        attempt: u32,
    },
    /// Cancel any pending retry timer.
    CancelRetry,
    /// Close every channel and stop the transport.
    Shutdown,
    /// Report an event to the application.
    Emit(LinkEvent),
}

/// Lifecycle events reported to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Joined or opened the room.
    Connected {
        /// Role now held.
        role: Role,
    },
    /// The host went away.
    HostLost {
        /// Reason for the loss.
        reason: String,
    },
    /// A rejoin attempt failed.
    RejoinFailed {
        /// Which attempt this was.
        attempt: u32,
        /// Error message describing the failure.
        error: String,
    },
    /// The membership failed for good.
    Failed {
        /// Human-readable description.
        message: String,
    },
    /// We left the room.
    Left,
}
