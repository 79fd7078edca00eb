//! TCP transport for simulating the Bluetooth link during development

use crate::transport::traits::{LinkAdapter, TransportStream};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bt_client_shared::PeerAddress;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// TCP stream wrapper implementing TransportStream
pub struct TcpTransportStream {
    inner: TcpStream,
    peer: String,
}

impl TcpTransportStream {
    pub fn new(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".into());
        Self {
            inner: stream,
            peer,
        }
    }
}

impl AsyncRead for TcpTransportStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for TcpTransportStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl TransportStream for TcpTransportStream {
    fn peer(&self) -> String {
        format!("tcp://{}", self.peer)
    }
}

/// Adapter standing in for the Bluetooth radio with a TCP endpoint
///
/// The peer address is still validated by the connector but the link always
/// goes to the configured socket address.
pub struct TcpAdapter {
    address: String,
}

impl TcpAdapter {
    /// Create an adapter connecting to `address` (e.g. "127.0.0.1:9000")
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl LinkAdapter for TcpAdapter {
    async fn is_enabled(&self) -> bool {
        true
    }

    async fn open(&self, address: &PeerAddress) -> Result<Box<dyn TransportStream>> {
        debug!("[TCP] Simulating {} via {}", address, self.address);
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|e| anyhow!("TCP connect to {} failed: {}", self.address, e))?;
        stream.set_nodelay(true)?;

        info!("[TCP] Connected to {}", self.address);
        Ok(Box::new(TcpTransportStream::new(stream)))
    }

    fn name(&self) -> &'static str {
        "TcpSimulation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn peer_address() -> PeerAddress {
        "00:11:22:33:44:55".parse().expect("valid address")
    }

    #[tokio::test]
    async fn test_open_connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let local = listener.local_addr().expect("local addr");
        let adapter = TcpAdapter::new(local.to_string());

        let peer = peer_address();
        let (accepted, opened) = tokio::join!(listener.accept(), adapter.open(&peer));
        let (mut server, _) = accepted.expect("accept");
        let mut client = opened.expect("open");
        assert!(client.peer().starts_with("tcp://127.0.0.1:"));

        client.write_all(b"ping00").await.expect("write");
        let mut buf = [0u8; 6];
        server.read_exact(&mut buf).await.expect("read");
        assert_eq!(&buf, b"ping00");
    }

    #[tokio::test]
    async fn test_open_fails_without_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let local = listener.local_addr().expect("local addr");
        drop(listener);

        let adapter = TcpAdapter::new(local.to_string());
        assert!(adapter.is_enabled().await);
        assert!(adapter.open(&peer_address()).await.is_err());
    }
}
