//! Fixed-length framing for the inbound byte stream
//!
//! The peer sends text messages as bare frames:
//! ```text
//! [ 6 bytes: payload ][ 6 bytes: payload ] ...
//! ```
//!
//! There is no header, length prefix or checksum. Boundaries come from the
//! frame size alone, so a peer that sends a stream whose length is not a
//! multiple of the frame size desynchronizes every following frame until the
//! link is re-established.

use bytes::{Bytes, BytesMut};
use std::borrow::Cow;
use std::fmt;

/// Size of one inbound message frame in bytes
pub const FRAME_LEN: usize = 6;

/// A complete inbound message frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Bytes);

impl Frame {
    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Frame decoded as text, replacing invalid UTF-8 sequences
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Accumulates raw reads into fixed-length frames
#[derive(Debug, Default)]
pub struct FrameAssembler {
    /// Bytes received but not yet emitted as a frame
    buffer: BytesMut,
}

impl FrameAssembler {
    /// Create a new frame assembler
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(FRAME_LEN * 64),
        }
    }

    /// Append freshly read bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete frame, if one is buffered
    ///
    /// Call this repeatedly until it returns `None` to drain all complete frames
    pub fn next_frame(&mut self) -> Option<Frame> {
        if self.buffer.len() < FRAME_LEN {
            return None;
        }
        Some(Frame(self.buffer.split_to(FRAME_LEN).freeze()))
    }

    /// Number of bytes waiting for the rest of their frame
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
