//! RFCOMM transport implementation for Bluetooth connections

use crate::transport::traits::{LinkAdapter, TransportStream};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bluer::rfcomm::{Profile, Role, SocketAddr as RfcommAddr, Stream as RfcommStream};
use bluer::{Address, Uuid};
use bt_client_shared::{PeerAddress, SERIAL_PORT_SERVICE_UUID};
use futures::StreamExt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::{debug, info, warn};

/// RFCOMM stream wrapper implementing TransportStream
pub struct RfcommTransportStream {
    inner: RfcommStream,
    peer_addr: Address,
}

impl RfcommTransportStream {
    /// Create a new RFCOMM transport stream
    pub fn new(stream: RfcommStream, peer_addr: Address) -> Self {
        Self {
            inner: stream,
            peer_addr,
        }
    }
}

impl AsyncRead for RfcommTransportStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for RfcommTransportStream {
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

impl TransportStream for RfcommTransportStream {
    fn peer(&self) -> String {
        format!("rfcomm://{}", self.peer_addr)
    }
}

/// Configuration for the RFCOMM adapter
#[derive(Debug, Clone)]
pub struct RfcommConfig {
    /// Fixed RFCOMM channel; `None` resolves the service through its profile UUID
    pub channel: Option<u8>,
    /// Service class the peer is reached through
    pub service_uuid: Uuid,
}

impl Default for RfcommConfig {
    fn default() -> Self {
        Self {
            channel: None,
            service_uuid: Uuid::from_u128(SERIAL_PORT_SERVICE_UUID),
        }
    }
}

/// BlueZ adapter opening RFCOMM links to the peer
pub struct RfcommAdapter {
    session: bluer::Session,
    adapter: bluer::Adapter,
    config: RfcommConfig,
}

impl RfcommAdapter {
    /// Bind to the host's default Bluetooth adapter
    ///
    /// Fails when BlueZ is unreachable or the host has no adapter.
    pub async fn default_adapter(config: RfcommConfig) -> Result<Self> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;
        info!("[BT] Using adapter {}", adapter.name());
        Ok(Self {
            session,
            adapter,
            config,
        })
    }

    /// Connect a raw RFCOMM socket to a known channel
    async fn connect_channel(&self, target: Address, channel: u8) -> Result<RfcommStream> {
        let socket_addr = RfcommAddr::new(target, channel);
        debug!("[BT] Connecting to {} channel {}", target, channel);

        RfcommStream::connect(socket_addr)
            .await
            .map_err(|e| anyhow!("RFCOMM connect failed: {}", e))
    }

    /// Connect through the service profile and accept the stream BlueZ hands back
    async fn connect_profile(&self, target: Address) -> Result<RfcommStream> {
        let uuid = self.config.service_uuid;
        let profile = Profile {
            uuid,
            role: Some(Role::Client),
            require_authentication: Some(false),
            require_authorization: Some(false),
            auto_connect: Some(false),
            ..Default::default()
        };
        debug!("[BT] Connecting to {} service {}", target, uuid);

        // Dropping the handle unregisters the profile again
        let mut handle = self.session.register_profile(profile).await?;
        let device = self.adapter.device(target)?;

        // BlueZ delivers the socket to the profile while connect_profile is pending
        let (connected, request) = tokio::join!(device.connect_profile(&uuid), handle.next());
        connected.map_err(|e| anyhow!("profile connect failed: {}", e))?;

        let request = request.ok_or_else(|| anyhow!("profile closed before connection"))?;
        Ok(request.accept()?)
    }
}

#[async_trait]
impl LinkAdapter for RfcommAdapter {
    async fn is_enabled(&self) -> bool {
        match self.adapter.is_powered().await {
            Ok(powered) => powered,
            Err(e) => {
                warn!("[BT] Could not read adapter power state: {}", e);
                false
            }
        }
    }

    async fn cancel_discovery(&self) {
        // Discovery sessions are owned by the D-Bus clients that started them;
        // this client never starts one, so there is nothing of ours to stop.
        if let Ok(true) = self.adapter.is_discovering().await {
            debug!("[BT] Adapter is discovering, connect may be slow");
        }
    }

    async fn open(&self, address: &PeerAddress) -> Result<Box<dyn TransportStream>> {
        let target = Address::new(address.octets());

        let stream = match self.config.channel {
            Some(channel) => self.connect_channel(target, channel).await?,
            None => self.connect_profile(target).await?,
        };

        info!("[BT] Connected to {}", target);
        Ok(Box::new(RfcommTransportStream::new(stream, target)))
    }

    fn name(&self) -> &'static str {
        "Bluetooth"
    }
}
