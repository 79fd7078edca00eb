//! Persistent Bluetooth RFCOMM client
//!
//! Keeps one client link to a remote peer alive: connects with retry,
//! reassembles inbound fixed-length frames, drains an outbound write queue,
//! and reconnects whenever the link fails.

pub mod command;
pub mod connection;
pub mod transport;

pub use bt_client_shared::{Command, ConnectionState, ErrorKind, Frame, PeerAddress};
pub use command::CommandExecutor;
pub use connection::{ClientConfig, ClientEvent, EventSink, Supervisor, TransportMode};
