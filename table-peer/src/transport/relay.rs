//! Transport through a `tablesync-relay` broker.
//!
//! One TCP connection carries every channel of the endpoint. Frames are
//! MessagePack-encoded [`RelayFrame`]s with a 4-byte big-endian length
//! prefix. Requests (`listen`, `dial`) are correlated with their `Ack` or
//! `Refused` reply by a request number; channel traffic is turned into
//! [`TransportEvent`]s by a background reader task.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tablesync_types::{ChannelId, JoinMetadata, Refusal, RelayFrame, MAX_FRAME_SIZE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{Transport, TransportEvent};
use crate::TransportError;

#[derive(Debug)]
enum Reply {
    Ack(Option<ChannelId>),
    Refused(Refusal),
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;
type OpenSet = Arc<Mutex<HashSet<ChannelId>>>;

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Transport endpoint connected to a relay broker.
#[derive(Debug)]
pub struct RelayTransport {
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    pending: Pending,
    open: OpenSet,
    next_request: AtomicU64,
    events: tokio::sync::Mutex<mpsc::UnboundedReceiver<TransportEvent>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl RelayTransport {
    /// Connect to a relay broker.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();

        let pending: Pending = Arc::default();
        let open: OpenSet = Arc::default();
        let (tx, rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(read_loop(
            read_half,
            Arc::clone(&pending),
            Arc::clone(&open),
            tx,
        ));

        Ok(Self {
            writer: tokio::sync::Mutex::new(write_half),
            pending,
            open,
            next_request: AtomicU64::new(1),
            events: tokio::sync::Mutex::new(rx),
            reader: Mutex::new(Some(reader)),
        })
    }

    async fn write(&self, frame: &RelayFrame) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut writer, frame).await
    }

    async fn request(
        &self,
        build: impl FnOnce(u64) -> RelayFrame,
    ) -> Result<Reply, TransportError> {
        let request = self.next_request.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        guard(&self.pending).insert(request, tx);

        if let Err(e) = self.write(&build(request)).await {
            guard(&self.pending).remove(&request);
            return Err(e);
        }
        rx.await.map_err(|_| TransportError::Shutdown)
    }
}

impl Drop for RelayTransport {
    fn drop(&mut self) {
        if let Some(reader) = guard(&self.reader).take() {
            reader.abort();
        }
    }
}

#[async_trait]
impl Transport for RelayTransport {
    async fn listen(&self, address: &str) -> Result<(), TransportError> {
        let reply = self
            .request(|request| RelayFrame::Listen {
                request,
                address: address.to_string(),
            })
            .await?;
        match reply {
            Reply::Ack(_) => Ok(()),
            Reply::Refused(Refusal::AddressInUse) => {
                Err(TransportError::AddressInUse(address.to_string()))
            }
            Reply::Refused(other) => Err(TransportError::Protocol(format!(
                "listen on {} refused: {:?}",
                address, other
            ))),
        }
    }

    async fn unlisten(&self, address: &str) -> Result<(), TransportError> {
        self.write(&RelayFrame::Unlisten {
            address: address.to_string(),
        })
        .await
    }

    async fn dial(
        &self,
        address: &str,
        metadata: JoinMetadata,
    ) -> Result<ChannelId, TransportError> {
        let reply = self
            .request(|request| RelayFrame::Dial {
                request,
                address: address.to_string(),
                metadata,
            })
            .await?;
        match reply {
            Reply::Ack(Some(channel)) => Ok(channel),
            Reply::Ack(None) => Err(TransportError::Protocol(
                "dial acknowledged without a channel".into(),
            )),
            Reply::Refused(Refusal::Unreachable) => {
                Err(TransportError::Unreachable(address.to_string()))
            }
            Reply::Refused(other) => Err(TransportError::Protocol(format!(
                "dial to {} refused: {:?}",
                address, other
            ))),
        }
    }

    async fn send(&self, channel: ChannelId, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.is_open(channel) {
            return Err(TransportError::ChannelClosed(channel));
        }
        self.write(&RelayFrame::Send {
            channel,
            payload: bytes.to_vec(),
        })
        .await
    }

    fn is_open(&self, channel: ChannelId) -> bool {
        guard(&self.open).contains(&channel)
    }

    async fn close(&self, channel: ChannelId) -> Result<(), TransportError> {
        if !guard(&self.open).remove(&channel) {
            return Err(TransportError::ChannelClosed(channel));
        }
        self.write(&RelayFrame::Close { channel }).await
    }

    async fn shutdown(&self) {
        guard(&self.open).clear();
        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.shutdown().await {
                tracing::debug!("Relay connection shutdown: {}", e);
            }
        }
        if let Some(reader) = guard(&self.reader).take() {
            reader.abort();
        }
        guard(&self.pending).clear();
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        self.events.lock().await.recv().await
    }
}

async fn read_loop(
    mut reader: OwnedReadHalf,
    pending: Pending,
    open: OpenSet,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!("Relay closed the connection");
                break;
            }
            Err(e) => {
                tracing::warn!("Relay connection failed: {}", e);
                break;
            }
        };

        match frame {
            RelayFrame::Ack { request, channel } => {
                if let Some(tx) = guard(&pending).remove(&request) {
                    let _ = tx.send(Reply::Ack(channel));
                }
            }
            RelayFrame::Refused { request, reason } => {
                if let Some(tx) = guard(&pending).remove(&request) {
                    let _ = tx.send(Reply::Refused(reason));
                }
            }
            RelayFrame::Opened {
                channel,
                metadata,
                inbound,
            } => {
                guard(&open).insert(channel);
                let _ = events.send(TransportEvent::Opened {
                    channel,
                    metadata,
                    inbound,
                });
            }
            RelayFrame::Data { channel, payload } => {
                let _ = events.send(TransportEvent::Data {
                    channel,
                    bytes: payload,
                });
            }
            RelayFrame::Closed { channel, reason } => {
                guard(&open).remove(&channel);
                let _ = events.send(TransportEvent::Closed { channel, reason });
            }
            other => {
                tracing::warn!("Unexpected frame from relay: {:?}", other);
            }
        }
    }

    // The broker is gone: every channel went with it.
    let lost: Vec<ChannelId> = guard(&open).drain().collect();
    for channel in lost {
        let _ = events.send(TransportEvent::Closed {
            channel,
            reason: "relay connection lost".into(),
        });
    }
    guard(&pending).clear();
}

/// Read one length-prefixed frame; `None` on a clean end of stream.
async fn read_frame(reader: &mut OwnedReadHalf) -> Result<Option<RelayFrame>, TransportError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::Protocol(format!(
            "frame too large: {} > {}",
            len, MAX_FRAME_SIZE
        )));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(Some(RelayFrame::from_bytes(&buf)?))
}

async fn write_frame(
    writer: &mut OwnedWriteHalf,
    frame: &RelayFrame,
) -> Result<(), TransportError> {
    let bytes = frame.to_bytes()?;
    if bytes.len() > MAX_FRAME_SIZE {
        return Err(TransportError::Protocol(format!(
            "frame too large: {} > {}",
            bytes.len(),
            MAX_FRAME_SIZE
        )));
    }
    writer.write_all(&(bytes.len() as u32).to_be_bytes()).await?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
