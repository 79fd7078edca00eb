//! Reader loop turning the inbound stream into frames

use super::link::Link;
use super::supervisor::Shared;
use super::writer::{Writer, WriterHandle};
use bt_client_shared::{ErrorKind, FrameAssembler};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const READ_CHUNK_SIZE: usize = 1024;

/// Owns the input half of a live link and its paired writer
pub(crate) struct Reader<R> {
    id: u64,
    input: R,
    link: Link,
    writer: WriterHandle,
    cancel: CancellationToken,
    shared: Arc<Shared>,
}

impl<R: AsyncRead + Unpin + Send + 'static> Reader<R> {
    pub(crate) fn new(
        id: u64,
        input: R,
        link: Link,
        writer: WriterHandle,
        cancel: CancellationToken,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            id,
            input,
            link,
            writer,
            cancel,
            shared,
        }
    }

    /// Start the paired writer, then read until the link fails or is closed
    pub(crate) async fn run<W: AsyncWrite + Unpin + Send + 'static>(mut self, writer: Writer<W>) {
        tokio::spawn(writer.run());
        self.shared.mark_connected(self.id);
        info!("[READ] Reading from {}", self.link.peer());

        let err = self.read_frames().await;
        warn!("[READ] Link to {} failed: {}", self.link.peer(), err);
        self.shared
            .events
            .error_with(ErrorKind::Exception, err.to_string());

        if let Err(e) = self.writer.cancel() {
            // The closed link below still stops the writer
            debug!("[READ] Writer not terminated through its queue: {}", e);
        }
        self.link.close();
        drop(self.input);

        Shared::session_lost(&self.shared, self.id, &self.cancel);
    }

    /// Emit every complete frame; only returns on failure
    async fn read_frames(&mut self) -> io::Error {
        let mut assembler = FrameAssembler::new();
        let mut buf = [0u8; READ_CHUNK_SIZE];

        let err = loop {
            let n = tokio::select! {
                biased;
                _ = self.link.closed() => {
                    break io::Error::new(io::ErrorKind::ConnectionAborted, "socket closed")
                }
                result = self.input.read(&mut buf) => match result {
                    Ok(0) => {
                        break io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "connection closed by peer",
                        )
                    }
                    Ok(n) => n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => break e,
                },
            };

            assembler.extend(&buf[..n]);
            if self.link.is_closed() {
                continue;
            }
            while let Some(frame) = assembler.next_frame() {
                debug!("[READ] Frame: {}", frame);
                self.shared.events.message(frame);
            }
        };

        if assembler.buffered() > 0 {
            debug!("[READ] Dropping {} byte(s) of partial frame", assembler.buffered());
        }
        err
    }
}
