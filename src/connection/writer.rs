//! Writer loop draining the outbound queue onto the link

use super::event::Notifier;
use super::link::Link;
use super::queue::{Outbound, QueueError, QueueReceiver, QueueSender};
use bt_client_shared::ErrorKind;
use bytes::Bytes;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

/// Cloneable producer handle for a running writer
#[derive(Debug, Clone)]
pub struct WriterHandle {
    queue: QueueSender,
}

impl WriterHandle {
    pub fn new(queue: QueueSender) -> Self {
        Self { queue }
    }

    /// Queue a payload for the link
    pub fn enqueue(&self, payload: &str) -> Result<(), QueueError> {
        if payload.is_empty() {
            return Err(QueueError::EmptyPayload);
        }
        self.queue
            .push(Outbound::Payload(Bytes::copy_from_slice(payload.as_bytes())))
    }

    /// Ask the writer to exit once everything queued before this call is written
    ///
    /// Items queued afterwards are never written. A bounded queue that is full
    /// rejects the request with [`QueueError::Full`].
    pub fn cancel(&self) -> Result<(), QueueError> {
        self.queue.push(Outbound::Terminate)
    }
}

/// Drains queued payloads to the output half of a link
pub struct Writer<W> {
    output: W,
    queue: QueueReceiver,
    link: Link,
    events: Notifier,
}

impl<W: AsyncWrite + Unpin + Send + 'static> Writer<W> {
    pub fn new(output: W, queue: QueueReceiver, link: Link, events: Notifier) -> Self {
        Self {
            output,
            queue,
            link,
            events,
        }
    }

    /// Run until terminated, the link closes, or a write fails
    pub async fn run(mut self) {
        if let Err(e) = self.drain().await {
            error!("[WRITE] Write to {} failed: {}", self.link.peer(), e);
            self.events.error_with(ErrorKind::Exception, e.to_string());
            // Wakes the paired reader, which owns reconnection
            self.link.close();
        }

        if let Err(e) = self.output.shutdown().await {
            debug!("[WRITE] Output shutdown: {}", e);
        }
        debug!("[WRITE] Writer for {} exited", self.link.peer());
    }

    async fn drain(&mut self) -> io::Result<()> {
        loop {
            let item = tokio::select! {
                biased;
                item = self.queue.take() => item,
                _ = self.link.closed() => return Ok(()),
            };

            let bytes = match item {
                Some(Outbound::Payload(bytes)) => bytes,
                Some(Outbound::Terminate) | None => return Ok(()),
            };

            tokio::select! {
                result = write_payload(&mut self.output, &bytes) => result?,
                _ = self.link.closed() => return Ok(()),
            }
        }
    }
}

async fn write_payload<W: AsyncWrite + Unpin>(output: &mut W, bytes: &[u8]) -> io::Result<()> {
    output.write_all(bytes).await?;
    output.flush().await
}
