//! Per-connection handling.
//!
//! Each TCP connection is one endpoint. A reader loop feeds frames to the
//! [`Relay`]; a writer task drains the endpoint's outbox. An endpoint that
//! neither listens nor dials within the configured window is dropped.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tablesync_types::RelayFrame;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::error::{ProtocolError, ProtocolResult, RelayError};
use crate::server::{EndpointId, Relay};

/// Accept connections until the listener fails.
pub async fn serve(relay: Arc<Relay>, listener: TcpListener) -> Result<(), RelayError> {
    let local = listener.local_addr()?;
    tracing::info!("tablesync-relay listening on {}", local);
    loop {
        let (stream, remote) = listener.accept().await?;
        tracing::debug!("Accepted connection from {}", remote);
        let relay = Arc::clone(&relay);
        tokio::spawn(async move {
            if let Err(e) = handle(relay, stream).await {
                tracing::debug!("Connection from {} ended: {}", remote, e);
            }
        });
    }
}

/// Run one endpoint connection to completion.
pub async fn handle(relay: Arc<Relay>, stream: TcpStream) -> ProtocolResult<()> {
    stream.set_nodelay(true)?;
    let (mut reader, writer) = stream.into_split();
    let (endpoint, outbox) = relay.connect();
    let limit = relay.config().limits.max_frame_size;
    let writer_task = tokio::spawn(write_loop(writer, outbox, limit, endpoint));

    let result = read_loop(&relay, endpoint, &mut reader).await;
    if result.is_err() {
        relay.metrics().errors_total.fetch_add(1, Ordering::Relaxed);
    }

    relay.disconnect(endpoint);
    // The outbox sender is gone; the writer flushes what is queued and exits.
    let _ = writer_task.await;
    result
}

async fn read_loop<R: AsyncRead + Unpin>(
    relay: &Relay,
    endpoint: EndpointId,
    reader: &mut R,
) -> ProtocolResult<()> {
    let limits = &relay.config().limits;
    let mut active = false;
    loop {
        let frame = if active {
            read_frame(reader, limits.max_frame_size).await?
        } else {
            let read = read_frame(reader, limits.max_frame_size);
            match tokio::time::timeout(limits.listen_timeout(), read).await {
                Ok(frame) => frame?,
                Err(_) => {
                    tracing::warn!(
                        "Endpoint {} idle for {}s without listen or dial, dropping",
                        endpoint,
                        limits.listen_timeout_secs
                    );
                    return Ok(());
                }
            }
        };
        let Some(frame) = frame else {
            tracing::debug!("Endpoint {} closed the connection", endpoint);
            return Ok(());
        };
        active |= relay.handle(endpoint, frame);
    }
}

async fn write_loop<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut outbox: mpsc::UnboundedReceiver<RelayFrame>,
    limit: usize,
    endpoint: EndpointId,
) {
    while let Some(frame) = outbox.recv().await {
        if let Err(e) = write_frame(&mut writer, &frame, limit).await {
            tracing::debug!("Writing to endpoint {} failed: {}", endpoint, e);
            break;
        }
    }
    let _ = writer.shutdown().await;
}

/// Read one length-prefixed frame; `None` on a clean end of stream.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    limit: usize,
) -> ProtocolResult<Option<RelayFrame>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let size = u32::from_be_bytes(len_buf) as usize;
    if size > limit {
        return Err(ProtocolError::FrameTooLarge { size, limit });
    }

    let mut buf = vec![0u8; size];
    reader.read_exact(&mut buf).await?;
    Ok(Some(RelayFrame::from_bytes(&buf)?))
}

/// Write one length-prefixed frame.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &RelayFrame,
    limit: usize,
) -> ProtocolResult<()> {
    let bytes = frame.to_bytes()?;
    if bytes.len() > limit {
        return Err(ProtocolError::FrameTooLarge {
            size: bytes.len(),
            limit,
        });
    }
    writer.write_all(&(bytes.len() as u32).to_be_bytes()).await?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
