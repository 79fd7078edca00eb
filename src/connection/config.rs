//! Client configuration

use crate::transport::RfcommConfig;
use bt_client_shared::timing;
use std::time::Duration;

/// Link backend used to reach the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TransportMode {
    /// Use real RFCOMM Bluetooth (requires BlueZ)
    #[default]
    Rfcomm,
    /// Use TCP simulation (for development)
    TcpSimulation,
}

/// Configuration for the connection supervisor
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Peer address in `XX:XX:XX:XX:XX:XX` form, validated on every connect attempt
    pub address: String,
    /// Link backend
    pub mode: TransportMode,
    /// RFCOMM settings (when mode is Rfcomm)
    pub rfcomm: RfcommConfig,
    /// TCP simulation address (when mode is TcpSimulation)
    pub tcp_address: String,
    /// Pause between failed connect attempts
    pub retry_interval: Duration,
    /// Maximum queued writes; `None` leaves the write queue unbounded
    pub write_queue_capacity: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            mode: TransportMode::default(),
            rfcomm: RfcommConfig::default(),
            tcp_address: "127.0.0.1:9000".into(),
            retry_interval: Duration::from_millis(timing::RETRY_INTERVAL_MS),
            write_queue_capacity: None,
        }
    }
}
