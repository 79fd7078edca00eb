//! Transport trait abstraction for pluggable link backends

use anyhow::Result;
use async_trait::async_trait;
use bt_client_shared::PeerAddress;
use tokio::io::{AsyncRead, AsyncWrite};

/// A connected byte stream to the peer
pub trait TransportStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    /// Human-readable description of the remote end
    fn peer(&self) -> String;
}

/// The local transport adapter links are opened through
#[async_trait]
pub trait LinkAdapter: Send + Sync + 'static {
    /// Whether the adapter is powered and able to connect
    async fn is_enabled(&self) -> bool;

    /// Hook run before every open to quiet discovery this client owns
    ///
    /// Adapters may only be able to observe discovery started elsewhere; the
    /// BlueZ adapter logs it and leaves it running. Defaults to a no-op.
    async fn cancel_discovery(&self) {}

    /// Open a stream to the peer, releasing any partial resources on failure
    async fn open(&self, address: &PeerAddress) -> Result<Box<dyn TransportStream>>;

    /// Human-readable name for this transport
    fn name(&self) -> &'static str;
}
