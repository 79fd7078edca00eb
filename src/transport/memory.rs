//! In-memory adapter for exercising the connection loops in tests

use crate::transport::traits::{LinkAdapter, TransportStream};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bt_client_shared::PeerAddress;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::DuplexStream;
use tokio::sync::mpsc;

const LINK_BUFFER: usize = 1024;

impl TransportStream for DuplexStream {
    fn peer(&self) -> String {
        "memory".into()
    }
}

/// Adapter handing the far end of every opened link to the test
pub(crate) struct MemoryAdapter {
    enabled: AtomicBool,
    failures_left: AtomicUsize,
    open_delay_ms: AtomicUsize,
    opens: AtomicUsize,
    discovery_cancels: AtomicUsize,
    peers: mpsc::UnboundedSender<DuplexStream>,
}

impl MemoryAdapter {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<DuplexStream>) {
        let (peers, peer_rx) = mpsc::unbounded_channel();
        let adapter = Self {
            enabled: AtomicBool::new(true),
            failures_left: AtomicUsize::new(0),
            open_delay_ms: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
            discovery_cancels: AtomicUsize::new(0),
            peers,
        };
        (Arc::new(adapter), peer_rx)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Make the next `count` opens fail
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Make every open wait before completing
    pub fn set_open_delay(&self, delay: Duration) {
        self.open_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn discovery_cancels(&self) -> usize {
        self.discovery_cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkAdapter for MemoryAdapter {
    async fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    async fn cancel_discovery(&self) {
        self.discovery_cancels.fetch_add(1, Ordering::SeqCst);
    }

    async fn open(&self, _address: &PeerAddress) -> Result<Box<dyn TransportStream>> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let delay = self.open_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }

        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(anyhow!("simulated connect failure"));
        }

        let (client, peer) = tokio::io::duplex(LINK_BUFFER);
        self.peers
            .send(peer)
            .map_err(|_| anyhow!("test dropped the peer receiver"))?;
        Ok(Box::new(client))
    }

    fn name(&self) -> &'static str {
        "Memory"
    }
}
