//! In-process transport for tests and local play.
//!
//! Every [`MemoryTransport`] created from the same [`MemoryNetwork`] can
//! listen and dial the others. `shutdown()` drops an endpoint abruptly, the
//! way a crashed peer disappears: the other side of each of its channels
//! sees `Closed` and nothing else.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tablesync_types::{ChannelId, JoinMetadata};
use tokio::sync::mpsc;

use super::{Transport, TransportEvent};
use crate::TransportError;

type EndpointId = u64;

/// Shared switchboard connecting in-process endpoints.
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    inner: Arc<Mutex<NetworkInner>>,
}

#[derive(Debug, Default)]
struct NetworkInner {
    next_endpoint: EndpointId,
    next_channel: u64,
    endpoints: HashMap<EndpointId, mpsc::UnboundedSender<TransportEvent>>,
    listeners: HashMap<String, EndpointId>,
    links: HashMap<ChannelId, Link>,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    dialer: EndpointId,
    listener: EndpointId,
}

impl Link {
    fn other(&self, me: EndpointId) -> Option<EndpointId> {
        if me == self.dialer {
            Some(self.listener)
        } else if me == self.listener {
            Some(self.dialer)
        } else {
            None
        }
    }
}

impl NetworkInner {
    fn notify(&self, endpoint: EndpointId, event: TransportEvent) {
        if let Some(tx) = self.endpoints.get(&endpoint) {
            // A dropped receiver means the endpoint is already gone.
            let _ = tx.send(event);
        }
    }

    fn close_link(&mut self, channel: ChannelId, closer: EndpointId, reason: &str) {
        if let Some(link) = self.links.remove(&channel) {
            if let Some(other) = link.other(closer) {
                self.notify(
                    other,
                    TransportEvent::Closed {
                        channel,
                        reason: reason.to_string(),
                    },
                );
            }
        }
    }
}

impl MemoryNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new endpoint on this network.
    pub fn endpoint(&self) -> MemoryTransport {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut inner = self.lock();
            inner.next_endpoint += 1;
            let id = inner.next_endpoint;
            inner.endpoints.insert(id, tx);
            id
        };
        MemoryTransport {
            network: self.clone(),
            id,
            events: tokio::sync::Mutex::new(rx),
            fail_next_dial: Mutex::new(None),
        }
    }

    /// Whether some endpoint listens on `address`.
    pub fn is_listening(&self, address: &str) -> bool {
        self.lock().listeners.contains_key(address)
    }

    /// Number of open channels on the whole network.
    pub fn channel_count(&self) -> usize {
        self.lock().links.len()
    }

    fn lock(&self) -> MutexGuard<'_, NetworkInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One endpoint of a [`MemoryNetwork`].
#[derive(Debug)]
pub struct MemoryTransport {
    network: MemoryNetwork,
    id: EndpointId,
    events: tokio::sync::Mutex<mpsc::UnboundedReceiver<TransportEvent>>,
    fail_next_dial: Mutex<Option<TransportError>>,
}

impl MemoryTransport {
    /// The network this endpoint belongs to.
    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }

    /// Cause the next dial() to fail with the given error.
    pub fn fail_next_dial(&self, error: TransportError) {
        let mut slot = self
            .fail_next_dial
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(error);
    }

    fn take_dial_failure(&self) -> Option<TransportError> {
        self.fail_next_dial
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn alive(&self, inner: &NetworkInner) -> Result<(), TransportError> {
        if inner.endpoints.contains_key(&self.id) {
            Ok(())
        } else {
            Err(TransportError::Shutdown)
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn listen(&self, address: &str) -> Result<(), TransportError> {
        let mut inner = self.network.lock();
        self.alive(&inner)?;
        match inner.listeners.get(address) {
            Some(&owner) if owner == self.id => Ok(()),
            Some(_) => Err(TransportError::AddressInUse(address.to_string())),
            None => {
                inner.listeners.insert(address.to_string(), self.id);
                Ok(())
            }
        }
    }

    async fn unlisten(&self, address: &str) -> Result<(), TransportError> {
        let mut inner = self.network.lock();
        if inner.listeners.get(address) == Some(&self.id) {
            inner.listeners.remove(address);
        }
        Ok(())
    }

    async fn dial(
        &self,
        address: &str,
        metadata: JoinMetadata,
    ) -> Result<ChannelId, TransportError> {
        if let Some(error) = self.take_dial_failure() {
            return Err(error);
        }

        let mut inner = self.network.lock();
        self.alive(&inner)?;
        let listener = *inner
            .listeners
            .get(address)
            .ok_or_else(|| TransportError::Unreachable(address.to_string()))?;

        inner.next_channel += 1;
        let channel = ChannelId::new(inner.next_channel);
        inner.links.insert(
            channel,
            Link {
                dialer: self.id,
                listener,
            },
        );

        inner.notify(
            listener,
            TransportEvent::Opened {
                channel,
                metadata: Some(metadata),
                inbound: true,
            },
        );
        inner.notify(
            self.id,
            TransportEvent::Opened {
                channel,
                metadata: None,
                inbound: false,
            },
        );
        Ok(channel)
    }

    async fn send(&self, channel: ChannelId, bytes: &[u8]) -> Result<(), TransportError> {
        let inner = self.network.lock();
        self.alive(&inner)?;
        let other = inner
            .links
            .get(&channel)
            .and_then(|link| link.other(self.id))
            .ok_or(TransportError::ChannelClosed(channel))?;
        inner.notify(
            other,
            TransportEvent::Data {
                channel,
                bytes: bytes.to_vec(),
            },
        );
        Ok(())
    }

    fn is_open(&self, channel: ChannelId) -> bool {
        let inner = self.network.lock();
        inner
            .links
            .get(&channel)
            .is_some_and(|link| link.other(self.id).is_some())
    }

    async fn close(&self, channel: ChannelId) -> Result<(), TransportError> {
        let mut inner = self.network.lock();
        match inner.links.get(&channel) {
            Some(link) if link.other(self.id).is_some() => {
                inner.close_link(channel, self.id, "closed by peer");
                Ok(())
            }
            _ => Err(TransportError::ChannelClosed(channel)),
        }
    }

    async fn shutdown(&self) {
        let mut inner = self.network.lock();
        inner.listeners.retain(|_, owner| *owner != self.id);
        let mine: Vec<ChannelId> = inner
            .links
            .iter()
            .filter(|(_, link)| link.other(self.id).is_some())
            .map(|(channel, _)| *channel)
            .collect();
        for channel in mine {
            inner.close_link(channel, self.id, "peer vanished");
        }
        // Dropping the sender ends `next_event` once the queue drains.
        inner.endpoints.remove(&self.id);
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        self.events.lock().await.recv().await
    }
}
