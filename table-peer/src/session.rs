//! Session actor.
//!
//! One task per room membership owns everything: the transport (through the
//! [`ConnectionRegistry`]), the connection state machine, and either the
//! host's canonical table or the client's mirror. Transport events, user
//! commands and timers are serviced one at a time, so actions are applied in
//! a single total order on the host.
//!
//! Callers talk to the task through a cloneable [`SessionHandle`].

use std::collections::VecDeque;
use std::future;
use std::mem;
use std::sync::Arc;

use tablesync_core::{ConnectionState, Effect, EpochFence, Event, IgnoreReason, LinkEvent, Role};
use tablesync_types::{Action, ChannelId, JoinMetadata, Message, PlayerId, RoomId, TableState};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};

use crate::cache::ResumableSession;
use crate::client::{ClientRouter, ClientUpdate};
use crate::config::SessionConfig;
use crate::host::{Admission, HostProcessor};
use crate::migration::{Cause, MigrationPlan, Step};
use crate::registry::ConnectionRegistry;
use crate::transport::{Transport, TransportEvent};
use crate::{SessionError, TransportError};

const COMMAND_CAPACITY: usize = 64;

/// Something that happened in the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Joined or opened the room.
    Connected {
        /// Role now held.
        role: Role,
        /// Host epoch.
        epoch: u64,
    },
    /// A player was admitted (host only).
    PeerJoined {
        /// The admitted player.
        player_id: PlayerId,
        /// Whether the player was already in the roster.
        rejoined: bool,
    },
    /// A connection was refused (host only).
    PeerRejected {
        /// Player id the peer claimed, if any.
        player_id: Option<PlayerId>,
    },
    /// A player left the roster (host only).
    PeerLeft {
        /// The departed player.
        player_id: PlayerId,
    },
    /// The table changed.
    TableChanged {
        /// Host epoch of the change.
        epoch: u64,
    },
    /// The reducer ignored an action (host only).
    ActionIgnored {
        /// Action kind.
        kind: &'static str,
        /// Why it was ignored.
        reason: IgnoreReason,
    },
    /// The host refused us.
    Rejected {
        /// Message sent by the host.
        message: String,
    },
    /// The host went away.
    HostLost {
        /// Reason for the loss.
        reason: String,
    },
    /// The host announced a planned handover.
    HandoverStarted {
        /// The named successor.
        new_host: PlayerId,
    },
    /// This peer took over as host.
    BecameHost {
        /// Epoch now served.
        epoch: u64,
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

/// Snapshot of the session for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    /// Connection state.
    pub state: ConnectionState,
    /// Role, while connected.
    pub role: Option<Role>,
    /// Host epoch (served when host, highest seen otherwise).
    pub epoch: u64,
    /// Table (canonical when host, mirror otherwise).
    pub table: TableState,
    /// Room address.
    pub room_id: RoomId,
    /// This player.
    pub player_id: PlayerId,
}

impl SessionView {
    /// The current host, as far as this peer knows.
    pub fn host_id(&self) -> Option<&PlayerId> {
        match self.state {
            ConnectionState::Connected { .. } => self.table.players.first().map(|p| &p.id),
            _ => None,
        }
    }
}

enum Command {
    Request {
        action: Action,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Leave {
        forget: bool,
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<SessionView>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Request a board action.
    ///
    /// The host applies it directly; a client sends it to the host. Fails
    /// with [`SessionError::NotJoined`] when no host connection is open.
    pub async fn request(&self, action: Action) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Request { action, reply })
            .await
            .map_err(|_| SessionError::Stopped)?;
        rx.await.map_err(|_| SessionError::Stopped)?
    }

    /// Leave the room for good, handing it over first when hosting.
    ///
    /// The resumable snapshot is deleted.
    pub async fn leave(&self) -> Result<(), SessionError> {
        self.stop(true).await
    }

    /// Stop the session but keep the resumable snapshot for a later resume.
    ///
    /// A host still hands the room over to the remaining players.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.stop(false).await
    }

    async fn stop(&self, forget: bool) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Leave { forget, reply })
            .await
            .map_err(|_| SessionError::Stopped)?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    /// Current view of the session.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every view change.
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Wait until the view satisfies `predicate`.
    pub async fn wait_until(
        &self,
        mut predicate: impl FnMut(&SessionView) -> bool,
    ) -> Result<SessionView, SessionError> {
        let mut rx = self.view.clone();
        let view = rx
            .wait_for(|view| predicate(view))
            .await
            .map_err(|_| SessionError::Stopped)?;
        Ok(view.clone())
    }
}

/// How a session starts.
#[derive(Debug, Clone)]
pub enum Start {
    /// Open a new room.
    Host,
    /// Join an existing room.
    Join,
    /// Pick up a cached session.
    Resume(ResumableSession),
}

/// Entry points for room memberships.
pub struct Session;

impl Session {
    /// Open a new room on `transport`.
    pub fn host<T: Transport>(transport: Arc<T>, config: SessionConfig) -> SessionHandle {
        Self::spawn(transport, config, Start::Host)
    }

    /// Join an existing room on `transport`.
    pub fn join<T: Transport>(transport: Arc<T>, config: SessionConfig) -> SessionHandle {
        Self::spawn(transport, config, Start::Join)
    }

    /// Resume a cached session.
    ///
    /// A former host opens the room again if nobody holds the address, and
    /// rejoins as a client otherwise.
    pub fn resume<T: Transport>(
        transport: Arc<T>,
        config: SessionConfig,
        cached: ResumableSession,
    ) -> SessionHandle {
        Self::spawn(transport, config, Start::Resume(cached))
    }

    /// Spawn the session task.
    pub fn spawn<T: Transport>(
        transport: Arc<T>,
        config: SessionConfig,
        start: Start,
    ) -> SessionHandle {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (events_tx, _) = broadcast::channel(config.event_capacity);

        let (table, host_epoch, fence, event, fallback) = match start {
            Start::Host => (
                TableState::new(),
                0,
                EpochFence::default(),
                Event::HostRequested,
                false,
            ),
            Start::Join => (
                TableState::new(),
                0,
                EpochFence::default(),
                Event::JoinRequested,
                false,
            ),
            Start::Resume(cached) if cached.was_host => {
                let fence = EpochFence::new(cached.epoch);
                (cached.table, fence.next(), fence, Event::HostRequested, true)
            }
            // The room may have restarted at a lower epoch since.
            Start::Resume(cached) => (
                cached.table,
                0,
                EpochFence::default(),
                Event::JoinRequested,
                false,
            ),
        };

        let router = ClientRouter::new(
            config.player_id.clone(),
            table.clone(),
            fence,
            config.rng(),
        );
        let (view_tx, view_rx) = watch::channel(SessionView {
            state: ConnectionState::Idle,
            role: None,
            epoch: fence.current(),
            table,
            room_id: config.room_id.clone(),
            player_id: config.player_id.clone(),
        });

        let actor = Actor {
            registry: ConnectionRegistry::new(Arc::clone(&transport)),
            config,
            state: ConnectionState::Idle,
            authority: Authority::Client(router),
            host_epoch,
            resume_fallback: fallback,
            host_channel: None,
            plan: None,
            retry_at: None,
            prune_at: None,
            transport_alive: true,
            view: view_tx,
            events: events_tx.clone(),
        };
        tokio::spawn(actor.run(transport, commands_rx, event));

        SessionHandle {
            commands: commands_tx,
            view: view_rx,
            events: events_tx,
        }
    }
}

enum Authority {
    Host(HostProcessor),
    Client(ClientRouter),
    Vacant,
}

struct Actor<T: Transport> {
    config: SessionConfig,
    registry: ConnectionRegistry<T>,
    state: ConnectionState,
    authority: Authority,
    /// Epoch served when this peer opens the room.
    host_epoch: u64,
    /// Whether a refused initial listen falls back to joining.
    resume_fallback: bool,
    host_channel: Option<ChannelId>,
    plan: Option<MigrationPlan>,
    retry_at: Option<Instant>,
    prune_at: Option<Instant>,
    transport_alive: bool,
    view: watch::Sender<SessionView>,
    events: broadcast::Sender<SessionEvent>,
}

async fn sleep_until_some(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => future::pending().await,
    }
}

impl<T: Transport> Actor<T> {
    async fn run(mut self, transport: Arc<T>, mut commands: mpsc::Receiver<Command>, first: Event) {
        tracing::info!(
            "Session for {} in room {} starting",
            self.config.player_id,
            self.config.room_id
        );
        self.drive(first).await;

        loop {
            let retry_at = self.retry_at;
            let deadline = self.plan.as_ref().map(|plan| plan.deadline());
            let prune_at = self.prune_at;

            tokio::select! {
                event = transport.next_event(), if self.transport_alive => match event {
                    Some(event) => self.on_transport_event(event).await,
                    None => {
                        self.transport_alive = false;
                        self.drive(Event::TransportFailed {
                            error: TransportError::Shutdown.to_string(),
                        })
                        .await;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Request { action, reply }) => {
                        let result = self.on_request(action).await;
                        let _ = reply.send(result);
                    }
                    Some(Command::Leave { forget, reply }) => {
                        self.on_leave(forget).await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        tracing::debug!("Every session handle dropped");
                        self.on_leave(false).await;
                        break;
                    }
                },
                _ = sleep_until_some(retry_at) => {
                    self.retry_at = None;
                    self.drive(Event::RetryTimer).await;
                }
                _ = sleep_until_some(deadline) => {
                    tracing::warn!("Host migration in room {} timed out", self.config.room_id);
                    self.plan = None;
                    self.drive(Event::MigrationTimedOut).await;
                }
                _ = sleep_until_some(prune_at) => {
                    self.prune_at = None;
                    self.prune().await;
                }
            }
        }
        tracing::info!("Session for {} stopped", self.config.player_id);
    }

    /// Feed one event through the state machine and execute its effects.
    async fn drive(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let before = self.state.name();
            let (state, effects) = mem::take(&mut self.state).on_event(event);
            if state.name() != before {
                tracing::debug!("Connection {} -> {}", before, state.name());
            }
            self.state = state;
            for effect in effects {
                if let Some(next) = self.execute(effect).await {
                    queue.push_back(next);
                }
            }
        }
        self.publish();
    }

    async fn execute(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Listen => self.open_room().await,
            Effect::Dial => self.dial().await,
            Effect::Rejoin => self.rejoin().await,
            Effect::StartRetryTimer { attempt } => {
                let delay = self.config.retry.delay(attempt);
                tracing::debug!("Rejoin attempt {} in {:?}", attempt + 1, delay);
                self.retry_at = Some(Instant::now() + delay);
                None
            }
            Effect::CancelRetry => {
                self.retry_at = None;
                None
            }
            Effect::Shutdown => {
                self.registry.shutdown().await;
                self.transport_alive = false;
                self.host_channel = None;
                None
            }
            Effect::Emit(event) => {
                self.emit_link(event);
                None
            }
        }
    }

    async fn open_room(&mut self) -> Option<Event> {
        let room = self.config.room_id.clone();
        match self.registry.transport().listen(room.as_str()).await {
            Ok(()) => {
                let table = self.table().clone();
                self.become_host(table, self.host_epoch);
                tracing::info!("Room {} created (epoch {})", room, self.host_epoch);
                Some(Event::Listening)
            }
            Err(TransportError::AddressInUse(_)) if self.resume_fallback => {
                tracing::info!("Room {} is hosted by someone else, rejoining", room);
                self.resume_fallback = false;
                self.state = ConnectionState::Idle;
                Some(Event::JoinRequested)
            }
            Err(e) => Some(Event::AttemptFailed {
                error: e.to_string(),
            }),
        }
    }

    async fn dial(&mut self) -> Option<Event> {
        let room = self.config.room_id.clone();
        match self
            .registry
            .transport()
            .dial(room.as_str(), self.config.join_metadata())
            .await
        {
            Ok(channel) => {
                tracing::debug!("Dialed room {} on channel {}", room, channel);
                self.registry.track_dial(channel);
                self.host_channel = Some(channel);
                None
            }
            Err(e) => Some(Event::AttemptFailed {
                error: e.to_string(),
            }),
        }
    }

    async fn rejoin(&mut self) -> Option<Event> {
        if let Some(old) = self.host_channel.take() {
            self.registry.close(old).await;
        }

        let plan = match &self.plan {
            Some(plan) => plan.clone(),
            None => {
                let Authority::Client(router) = &self.authority else {
                    return None;
                };
                let plan = MigrationPlan::begin(
                    &self.config.player_id,
                    router.table(),
                    router.fence(),
                    Cause::Crash,
                    Instant::now(),
                    self.config.migration_timeout,
                );
                tracing::info!(
                    "Host {} lost, {} (epoch {})",
                    plan.departed().map(|p| p.to_string()).unwrap_or_default(),
                    match plan.step() {
                        Step::Listen => "taking over",
                        Step::Dial => "waiting for successor",
                    },
                    plan.epoch()
                );
                self.plan = Some(plan.clone());
                plan
            }
        };

        if plan.step() == Step::Listen {
            match self.registry.transport().listen(self.config.room_id.as_str()).await {
                Ok(()) => {
                    let others = plan.seed().players.len() > 1;
                    self.become_host(plan.seed().clone(), plan.epoch());
                    if others {
                        self.prune_at = Some(Instant::now() + self.config.migration_timeout);
                    }
                    tracing::info!(
                        "Took over room {} (epoch {})",
                        self.config.room_id,
                        plan.epoch()
                    );
                    self.emit(SessionEvent::BecameHost {
                        epoch: plan.epoch(),
                    });
                    return Some(Event::Listening);
                }
                Err(TransportError::AddressInUse(_)) => {
                    tracing::info!("Room {} already reopened, dialing it", self.config.room_id);
                }
                Err(e) => {
                    return Some(Event::AttemptFailed {
                        error: e.to_string(),
                    })
                }
            }
        }
        self.dial().await
    }

    fn become_host(&mut self, table: TableState, epoch: u64) {
        let rng = match mem::replace(&mut self.authority, Authority::Vacant) {
            Authority::Client(router) => router.into_parts().2,
            Authority::Host(_) | Authority::Vacant => self.config.rng(),
        };
        self.authority = Authority::Host(HostProcessor::new(
            self.config.password.clone(),
            self.config.player(),
            table,
            epoch,
            rng,
        ));
        self.host_channel = None;
        self.plan = None;
    }

    async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened {
                channel,
                metadata,
                inbound,
            } => self.on_opened(channel, metadata, inbound).await,
            TransportEvent::Data { channel, bytes } => self.on_data(channel, &bytes).await,
            TransportEvent::Closed { channel, reason } => self.on_closed(channel, reason).await,
        }
    }

    async fn on_opened(
        &mut self,
        channel: ChannelId,
        metadata: Option<JoinMetadata>,
        inbound: bool,
    ) {
        if inbound {
            let Authority::Host(host) = &mut self.authority else {
                tracing::debug!("Refusing inbound channel {}: not hosting", channel);
                self.registry.close(channel).await;
                return;
            };
            match host.on_peer_opened(&mut self.registry, channel, metadata).await {
                Admission::Admitted {
                    player_id,
                    rejoined,
                } => {
                    self.emit(SessionEvent::PeerJoined {
                        player_id,
                        rejoined,
                    });
                    self.changed().await;
                }
                Admission::Rejected { player_id } => {
                    self.emit(SessionEvent::PeerRejected { player_id });
                }
            }
            return;
        }

        if self.host_channel == Some(channel) {
            self.registry.on_opened(channel, None, false);
            tracing::info!("Channel {} to room {} open", channel, self.config.room_id);
            self.drive(Event::HostReached).await;
        } else {
            tracing::debug!("Closing stale outbound channel {}", channel);
            self.registry.close(channel).await;
        }
    }

    async fn on_data(&mut self, channel: ChannelId, bytes: &[u8]) {
        match &mut self.authority {
            Authority::Host(host) => {
                match host.on_message(&mut self.registry, channel, bytes).await {
                    Some((_, Ok(()))) => self.changed().await,
                    Some((kind, Err(reason))) => {
                        self.emit(SessionEvent::ActionIgnored { kind, reason })
                    }
                    None => {}
                }
            }
            Authority::Client(router) if self.host_channel == Some(channel) => {
                let message = match Message::from_bytes(bytes) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!("Dropping undecodable payload from host: {}", e);
                        return;
                    }
                };
                tracing::debug!("Received {} from host", message.kind());
                let update = router.on_message(message);
                self.on_client_update(update).await;
            }
            _ => tracing::debug!("Ignoring data on channel {}", channel),
        }
    }

    async fn on_client_update(&mut self, update: ClientUpdate) {
        match update {
            ClientUpdate::Snapshot { epoch, .. } => {
                if self.plan.as_ref().is_some_and(|plan| plan.completed_by(epoch)) {
                    tracing::info!(
                        "Host migration in room {} complete (epoch {})",
                        self.config.room_id,
                        epoch
                    );
                    self.plan = None;
                }
                self.emit(SessionEvent::TableChanged { epoch });
                self.changed().await;
            }
            ClientUpdate::Stale { epoch } => {
                tracing::debug!("Dropped snapshot from replaced host (epoch {})", epoch);
            }
            ClientUpdate::Handover(transfer) => {
                tracing::info!(
                    "Host handed room {} over to {} (epoch {})",
                    self.config.room_id,
                    transfer.new_host_id,
                    transfer.epoch
                );
                let new_host = transfer.new_host_id.clone();
                let Authority::Client(router) = &self.authority else {
                    return;
                };
                self.plan = Some(MigrationPlan::begin(
                    &self.config.player_id,
                    router.table(),
                    router.fence(),
                    Cause::Handover(transfer),
                    Instant::now(),
                    self.config.migration_timeout,
                ));
                self.emit(SessionEvent::HandoverStarted { new_host });
                self.drive(Event::HandoverReceived).await;
            }
            ClientUpdate::Rejected(message) => {
                tracing::warn!("Room {} refused us: {}", self.config.room_id, message);
                self.emit(SessionEvent::Rejected {
                    message: message.clone(),
                });
                self.drive(Event::Rejected { message }).await;
            }
            ClientUpdate::Ignored => {}
        }
    }

    async fn on_closed(&mut self, channel: ChannelId, reason: String) {
        // Channels we closed ourselves are already forgotten.
        let Some(info) = self.registry.on_closed(channel) else {
            return;
        };

        if let Authority::Host(host) = &mut self.authority {
            if let Some(player_id) = host.on_peer_closed(&mut self.registry, info.player_id).await {
                self.emit(SessionEvent::PeerLeft { player_id });
                self.changed().await;
            }
            return;
        }

        if self.host_channel == Some(channel) {
            self.host_channel = None;
            tracing::info!("Channel {} to host closed: {}", channel, reason);
            let event = if matches!(self.state, ConnectionState::Initializing { .. }) {
                Event::AttemptFailed { error: reason }
            } else {
                Event::HostLost { reason }
            };
            self.drive(event).await;
        }
    }

    async fn on_request(&mut self, action: Action) -> Result<(), SessionError> {
        if !self.state.is_connected() {
            return Err(SessionError::NotJoined);
        }
        match &mut self.authority {
            Authority::Host(host) => {
                let kind = action.kind();
                match host.apply(&mut self.registry, &action).await {
                    Ok(()) => self.changed().await,
                    Err(reason) => self.emit(SessionEvent::ActionIgnored { kind, reason }),
                }
                Ok(())
            }
            Authority::Client(router) => {
                let channel = self
                    .host_channel
                    .filter(|channel| self.registry.is_open(*channel))
                    .ok_or(SessionError::NotJoined)?;
                let message = router.request(&action);
                self.registry.send(channel, &message).await?;
                if router.echo(&action) {
                    self.publish();
                }
                Ok(())
            }
            Authority::Vacant => Err(SessionError::NotJoined),
        }
    }

    async fn on_leave(&mut self, forget: bool) {
        if let Authority::Host(host) = &self.authority {
            if host.table().players.len() > 1 {
                host.hand_over(&mut self.registry).await;
            }
        }
        if let Some(path) = self.config.cache_path.as_ref().filter(|_| forget) {
            if let Err(e) = ResumableSession::clear(path).await {
                tracing::warn!("Failed to clear resumable session: {}", e);
            }
        }
        self.plan = None;
        self.drive(Event::LeaveRequested).await;
        tracing::info!("Left room {}", self.config.room_id);
    }

    async fn prune(&mut self) {
        let Authority::Host(host) = &mut self.authority else {
            return;
        };
        let pruned = host.prune_absent(&mut self.registry).await;
        if pruned.is_empty() {
            return;
        }
        for player_id in pruned {
            self.emit(SessionEvent::PeerLeft { player_id });
        }
        self.changed().await;
    }

    fn table(&self) -> &TableState {
        match &self.authority {
            Authority::Host(host) => host.table(),
            Authority::Client(router) => router.table(),
            Authority::Vacant => {
                static EMPTY: TableState = TableState::new();
                &EMPTY
            }
        }
    }

    fn epoch(&self) -> u64 {
        match &self.authority {
            Authority::Host(host) => host.epoch(),
            Authority::Client(router) => router.fence().current(),
            Authority::Vacant => 0,
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn emit_link(&self, event: LinkEvent) {
        let event = match event {
            LinkEvent::Connected { role } => {
                tracing::info!("Connected to room {} as {:?}", self.config.room_id, role);
                SessionEvent::Connected {
                    role,
                    epoch: self.epoch(),
                }
            }
            LinkEvent::HostLost { reason } => SessionEvent::HostLost { reason },
            LinkEvent::RejoinFailed { attempt, error } => {
                tracing::debug!("Rejoin attempt {} failed: {}", attempt, error);
                SessionEvent::RejoinFailed { attempt, error }
            }
            LinkEvent::Failed { message } => {
                tracing::warn!("Session in room {} failed: {}", self.config.room_id, message);
                SessionEvent::Failed { message }
            }
            LinkEvent::Left => SessionEvent::Left,
        };
        self.emit(event);
    }

    fn publish(&self) {
        let role = match self.state {
            ConnectionState::Connected { role } => Some(role),
            _ => None,
        };
        self.view.send_replace(SessionView {
            state: self.state.clone(),
            role,
            epoch: self.epoch(),
            table: self.table().clone(),
            room_id: self.config.room_id.clone(),
            player_id: self.config.player_id.clone(),
        });
    }

    /// The table changed: refresh the view and the resumable snapshot.
    async fn changed(&mut self) {
        self.publish();
        let Some(path) = &self.config.cache_path else {
            return;
        };
        let snapshot = ResumableSession {
            room_id: self.config.room_id.clone(),
            password: self.config.password.clone(),
            player_id: self.config.player_id.clone(),
            display_name: self.config.display_name.clone(),
            was_host: self.state.is_host(),
            epoch: self.epoch(),
            table: self.table().clone(),
        };
        if let Err(e) = snapshot.save(path).await {
            tracing::warn!("Failed to save resumable session: {}", e);
        }
    }
}
