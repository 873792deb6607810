//! Rendezvous broker.
//!
//! The broker maps logical addresses (room ids) to the endpoint listening on
//! them and forwards channel traffic between endpoints. Payloads are opaque:
//! the broker never decodes what peers send each other.
//!
//! Every endpoint owns an outbox; the broker only ever pushes frames into
//! outboxes, and the connection task writes them to the socket.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tablesync_types::{ChannelId, JoinMetadata, Refusal, RelayFrame};
use tokio::sync::mpsc;

use crate::config::Config;

/// Identifier of one connected endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(u64);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ep-{}", self.0)
    }
}

/// Operational metrics for monitoring relay activity.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Endpoints that connected.
    pub connections_total: AtomicU64,
    /// Channels opened by successful dials.
    pub channels_opened: AtomicU64,
    /// Payload frames forwarded.
    pub frames_forwarded: AtomicU64,
    /// Payload bytes forwarded.
    pub bytes_forwarded: AtomicU64,
    /// Listen or dial requests refused.
    pub refusals_total: AtomicU64,
    /// Connections dropped for protocol errors or idling.
    pub errors_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
struct Channel {
    dialer: EndpointId,
    listener: EndpointId,
}

impl Channel {
    fn other(&self, endpoint: EndpointId) -> Option<EndpointId> {
        if endpoint == self.dialer {
            Some(self.listener)
        } else if endpoint == self.listener {
            Some(self.dialer)
        } else {
            None
        }
    }

    fn involves(&self, endpoint: EndpointId) -> bool {
        self.dialer == endpoint || self.listener == endpoint
    }
}

/// Main relay broker.
pub struct Relay {
    config: Config,
    metrics: RelayMetrics,
    /// Outbox of every connected endpoint.
    endpoints: DashMap<EndpointId, mpsc::UnboundedSender<RelayFrame>>,
    /// Address → listening endpoint.
    addresses: DashMap<String, EndpointId>,
    /// Open channels.
    channels: DashMap<ChannelId, Channel>,
    next_endpoint: AtomicU64,
    next_channel: AtomicU64,
}

impl fmt::Debug for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .field("endpoints", &self.endpoints.len())
            .field("addresses", &self.addresses.len())
            .field("channels", &self.channels.len())
            .finish_non_exhaustive()
    }
}

impl Relay {
    /// Create a broker.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            metrics: RelayMetrics::default(),
            endpoints: DashMap::new(),
            addresses: DashMap::new(),
            channels: DashMap::new(),
            next_endpoint: AtomicU64::new(1),
            next_channel: AtomicU64::new(1),
        }
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Number of open channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Endpoint listening on `address`, if any.
    pub fn listener_of(&self, address: &str) -> Option<EndpointId> {
        self.addresses.get(address).map(|entry| *entry.value())
    }

    /// Register a new endpoint; frames for it arrive on the returned receiver.
    pub fn connect(&self) -> (EndpointId, mpsc::UnboundedReceiver<RelayFrame>) {
        let id = EndpointId(self.next_endpoint.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.endpoints.insert(id, tx);
        self.metrics.connections_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Endpoint {} connected (total: {})", id, self.endpoints.len());
        (id, rx)
    }

    /// Handle one frame from `endpoint`.
    ///
    /// Returns whether the frame was a `listen` or `dial` request, which
    /// marks the endpoint as active.
    pub fn handle(&self, endpoint: EndpointId, frame: RelayFrame) -> bool {
        match frame {
            RelayFrame::Listen { request, address } => {
                let reply = match self.listen(endpoint, &address) {
                    Ok(()) => RelayFrame::Ack {
                        request,
                        channel: None,
                    },
                    Err(reason) => self.refuse(request, reason),
                };
                self.push(endpoint, reply);
                true
            }
            RelayFrame::Unlisten { address } => {
                self.unlisten(endpoint, &address);
                false
            }
            RelayFrame::Dial {
                request,
                address,
                metadata,
            } => {
                self.dial(endpoint, request, &address, metadata);
                true
            }
            RelayFrame::Send { channel, payload } => {
                self.forward(endpoint, channel, payload);
                false
            }
            RelayFrame::Close { channel } => {
                self.close(endpoint, channel, "closed by peer");
                false
            }
            other => {
                tracing::warn!("Endpoint {} sent a relay-only frame: {:?}", endpoint, other);
                false
            }
        }
    }

    fn listen(&self, endpoint: EndpointId, address: &str) -> Result<(), Refusal> {
        match self.addresses.entry(address.to_string()) {
            Entry::Occupied(entry) if *entry.get() == endpoint => Ok(()),
            Entry::Occupied(_) => Err(Refusal::AddressInUse),
            Entry::Vacant(entry) => {
                entry.insert(endpoint);
                tracing::info!("Endpoint {} listening on {}", endpoint, address);
                Ok(())
            }
        }
    }

    fn unlisten(&self, endpoint: EndpointId, address: &str) {
        if self
            .addresses
            .remove_if(address, |_, owner| *owner == endpoint)
            .is_some()
        {
            tracing::info!("Endpoint {} stopped listening on {}", endpoint, address);
        }
    }

    fn dial(&self, endpoint: EndpointId, request: u64, address: &str, metadata: JoinMetadata) {
        let Some(listener) = self.listener_of(address) else {
            tracing::debug!("Dial from {} to {}: nobody listens", endpoint, address);
            let reply = self.refuse(request, Refusal::Unreachable);
            self.push(endpoint, reply);
            return;
        };

        let limit = self.config.limits.max_channels_per_endpoint;
        if self.channels_of(endpoint) >= limit || self.channels_of(listener) >= limit {
            tracing::warn!(
                "Dial from {} to {}: channel limit {} reached",
                endpoint,
                address,
                limit
            );
            let reply = self.refuse(request, Refusal::TooManyChannels);
            self.push(endpoint, reply);
            return;
        }

        let channel = ChannelId::new(self.next_channel.fetch_add(1, Ordering::Relaxed));
        self.channels.insert(
            channel,
            Channel {
                dialer: endpoint,
                listener,
            },
        );
        self.metrics.channels_opened.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "Channel {} opened: {} -> {} ({})",
            channel,
            endpoint,
            listener,
            address
        );

        // The dialer learns the channel id before any traffic on it.
        self.push(
            endpoint,
            RelayFrame::Ack {
                request,
                channel: Some(channel),
            },
        );
        self.push(
            listener,
            RelayFrame::Opened {
                channel,
                metadata: Some(metadata),
                inbound: true,
            },
        );
        self.push(
            endpoint,
            RelayFrame::Opened {
                channel,
                metadata: None,
                inbound: false,
            },
        );
    }

    fn forward(&self, endpoint: EndpointId, channel: ChannelId, payload: Vec<u8>) {
        let target = self
            .channels
            .get(&channel)
            .and_then(|entry| entry.value().other(endpoint));
        let Some(target) = target else {
            tracing::debug!("Endpoint {} sent on unknown channel {}", endpoint, channel);
            self.push(
                endpoint,
                RelayFrame::Closed {
                    channel,
                    reason: "unknown channel".into(),
                },
            );
            return;
        };
        self.metrics.frames_forwarded.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .bytes_forwarded
            .fetch_add(payload.len() as u64, Ordering::Relaxed);
        self.push(target, RelayFrame::Data { channel, payload });
    }

    fn close(&self, endpoint: EndpointId, channel: ChannelId, reason: &str) {
        let removed = self
            .channels
            .remove_if(&channel, |_, ends| ends.involves(endpoint));
        if let Some((_, ends)) = removed {
            if let Some(other) = ends.other(endpoint) {
                self.push(
                    other,
                    RelayFrame::Closed {
                        channel,
                        reason: reason.to_string(),
                    },
                );
            }
            tracing::debug!("Channel {} closed by {}", channel, endpoint);
        }
    }

    /// Forget an endpoint: release its addresses and close its channels.
    pub fn disconnect(&self, endpoint: EndpointId) {
        self.endpoints.remove(&endpoint);
        self.addresses.retain(|address, owner| {
            if *owner == endpoint {
                tracing::info!("Endpoint {} gone, releasing {}", endpoint, address);
                false
            } else {
                true
            }
        });
        let channels: Vec<ChannelId> = self
            .channels
            .iter()
            .filter(|entry| entry.value().involves(endpoint))
            .map(|entry| *entry.key())
            .collect();
        for channel in channels {
            self.close(endpoint, channel, "peer vanished");
        }
        tracing::debug!("Endpoint {} disconnected (remaining: {})", endpoint, self.endpoints.len());
    }

    fn channels_of(&self, endpoint: EndpointId) -> usize {
        self.channels
            .iter()
            .filter(|entry| entry.value().involves(endpoint))
            .count()
    }

    fn refuse(&self, request: u64, reason: Refusal) -> RelayFrame {
        self.metrics.refusals_total.fetch_add(1, Ordering::Relaxed);
        RelayFrame::Refused { request, reason }
    }

    fn push(&self, endpoint: EndpointId, frame: RelayFrame) {
        let sent = self
            .endpoints
            .get(&endpoint)
            .map(|outbox| outbox.send(frame).is_ok())
            .unwrap_or(false);
        if !sent {
            tracing::debug!("Dropping frame for departed endpoint {}", endpoint);
        }
    }
}
