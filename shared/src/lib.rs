//! Bluetooth Client Shared Protocol Types
//!
//! This crate provides the wire-level framing, peer address validation,
//! command parsing and connection lifecycle vocabulary used by the client.

pub mod address;
pub mod codec;
pub mod command;
pub mod state_machine;

use std::fmt;

pub use address::{AddressError, PeerAddress};
pub use codec::{Frame, FrameAssembler, FRAME_LEN};
pub use command::{Command, CommandError};
pub use state_machine::{StateTracker, TransitionResult};

/// Serial Port Profile service class UUID (`00001101-0000-1000-8000-00805F9B34FB`)
pub const SERIAL_PORT_SERVICE_UUID: u128 = 0x00001101_0000_1000_8000_00805F9B34FB;

/// Timing parameters for the connection loops
pub mod timing {
    /// Pause between two failed connect attempts in milliseconds
    pub const RETRY_INTERVAL_MS: u64 = 500;
}

/// Lifecycle of the single client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Supervisor created, nothing requested yet
    Unstarted,
    /// Connect loop running
    Connecting,
    /// Reader and writer running on a live link
    Connected,
    /// Torn down by an explicit stop
    Stopped,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Unstarted => "UNSTARTED",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Connected => "CONNECTED",
            ConnectionState::Stopped => "STOPPED",
        };
        f.write_str(name)
    }
}

/// Kinds of error notifications emitted by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No transport adapter on this host (fatal)
    Unsupported,
    /// Adapter present but powered off (retried)
    Disabled,
    /// I/O failure on a live or opening link (reconnects)
    Exception,
    /// Write requested while no link is up; context carries the payload
    WriteFailure,
}

impl ErrorKind {
    /// Whether this error ends the owning service
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::Unsupported)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unsupported => "UNSUPPORTED",
            ErrorKind::Disabled => "DISABLED",
            ErrorKind::Exception => "EXCEPTION",
            ErrorKind::WriteFailure => "WRITE_FAILURE",
        };
        f.write_str(name)
    }
}
